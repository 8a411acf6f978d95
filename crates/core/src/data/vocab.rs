//! Entity vocabulary

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Mapping from entity surface form to numeric id.
///
/// Training construction only uses the unknown entry's id (every candidate
/// slot is marked "is an entity" rather than typed); the full mapping is
/// consulted when encoding known spans for prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityVocab {
    entries: HashMap<String, u32>,
}

impl EntityVocab {
    /// Surface form of the unknown-entity entry
    pub const UNKNOWN: &'static str = "[UNK]";

    /// Create a vocabulary; the unknown entry is required
    pub fn new(entries: HashMap<String, u32>) -> Result<Self> {
        if !entries.contains_key(Self::UNKNOWN) {
            return Err(Error::Vocab(format!(
                "missing the required {:?} entry",
                Self::UNKNOWN
            )));
        }
        Ok(Self { entries })
    }

    /// Load from a JSON object of surface form to id
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let entries: HashMap<String, u32> = serde_json::from_str(&data)?;
        Self::new(entries)
    }

    /// Id of the unknown-entity entry
    pub fn unknown_id(&self) -> u32 {
        self.entries[Self::UNKNOWN]
    }

    /// Id for a surface form, falling back to the unknown id
    pub fn id(&self, surface: &str) -> u32 {
        self.entries
            .get(surface)
            .copied()
            .unwrap_or_else(|| self.unknown_id())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the vocabulary has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
