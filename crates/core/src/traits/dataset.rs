//! Dataset capability

use crate::data::DataLoader;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Dataset split
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Split {
    Train,
    Dev,
    Test,
}

impl Split {
    /// Conventional lowercase name used in corpus file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Dev => "dev",
            Self::Test => "test",
        }
    }
}

/// A corpus that can be built into batches of span training examples.
///
/// One implementation exists per corpus; the variant is selected once at
/// configuration time. Implementations hold only read-only configuration,
/// so a dataset may be shared across data-loading workers.
pub trait NerDataset {
    /// The label assigned to non-entity spans
    fn null_label(&self) -> &str;

    /// Entity type labels, excluding the null label
    fn labels(&self) -> &[String];

    /// Build all examples for a split and wrap them in a loader.
    ///
    /// Shuffling between epochs is enabled for [`Split::Train`] only.
    fn build(&self, split: Split, batch_size: usize) -> Result<DataLoader>;

    /// The full label set: null label first, then entity types
    fn all_labels(&self) -> Vec<String> {
        std::iter::once(self.null_label().to_string())
            .chain(self.labels().iter().cloned())
            .collect()
    }

    /// Index of a label in [`NerDataset::all_labels`]
    fn label_index(&self, label: &str) -> Option<usize> {
        if label == self.null_label() {
            return Some(0);
        }
        self.labels()
            .iter()
            .position(|known| known == label)
            .map(|i| i + 1)
    }
}
