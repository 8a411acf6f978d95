//! Pipeline configuration

use crate::error::{Device, Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for example construction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Maximum sequence length in sub-tokens, including the two sentinel slots
    pub max_seq_length: usize,

    /// Maximum candidate spans per example
    pub max_entities: usize,

    /// Maximum sub-token length of a single span
    pub max_entity_span: usize,

    /// Device output tensors are created on
    pub device: Device,

    /// Re-cut the entity dimension of each batch to its maximum occupied
    /// slot count instead of the configured ceiling
    pub cut_extra_padding: bool,

    /// Seed for the negative-span sampling stream (fixed once per run)
    pub seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            max_seq_length: 512,
            max_entities: 128,
            max_entity_span: 30,
            device: Device::Cpu,
            cut_extra_padding: true,
            seed: 0,
        }
    }
}

impl DataConfig {
    /// Create the default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum sequence length
    pub fn with_max_seq_length(mut self, max_seq_length: usize) -> Self {
        self.max_seq_length = max_seq_length;
        self
    }

    /// Set the maximum candidate span count per example
    pub fn with_max_entities(mut self, max_entities: usize) -> Self {
        self.max_entities = max_entities;
        self
    }

    /// Set the maximum sub-token length of a span
    pub fn with_max_entity_span(mut self, max_entity_span: usize) -> Self {
        self.max_entity_span = max_entity_span;
        self
    }

    /// Set the target device
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Enable or disable batch entity-padding cuts
    pub fn with_cut_extra_padding(mut self, cut: bool) -> Self {
        self.cut_extra_padding = cut;
        self
    }

    /// Set the sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the limits before any per-example work begins.
    ///
    /// `max_seq_length` must leave room for at least one sub-token next to
    /// the two sentinel slots.
    pub fn validate(&self) -> Result<()> {
        if self.max_seq_length <= 2 {
            return Err(Error::Configuration(format!(
                "max_seq_length must exceed the two sentinel slots (got {})",
                self.max_seq_length
            )));
        }
        if self.max_entities == 0 {
            return Err(Error::Configuration(
                "max_entities must be a positive integer".to_string(),
            ));
        }
        if self.max_entity_span == 0 {
            return Err(Error::Configuration(
                "max_entity_span must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}
