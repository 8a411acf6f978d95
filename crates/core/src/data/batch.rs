//! Batch collation and epoch iteration

use crate::data::example::{NerExample, TensorResultExt};
use crate::error::{Error, Result};
use candle_core::Tensor;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// A collated batch of examples, ready for a model forward pass.
///
/// Word tensors are `batch × max_seq_length`; entity tensors are
/// `batch × N` (`× max_entity_span` for positions) where `N` is
/// `max_entities`, or the batch's maximum occupied slot count when the
/// extra padding was cut.
#[derive(Clone, Debug)]
pub struct NerBatch {
    /// Stacked word sub-token ids
    pub word_ids: Tensor,
    /// Stacked word segment ids
    pub word_segments: Tensor,
    /// Stacked word attention masks
    pub word_attention_mask: Tensor,
    /// Stacked entity ids
    pub entity_ids: Tensor,
    /// Stacked entity attention masks
    pub entity_attention_mask: Tensor,
    /// Stacked span position matrices
    pub entity_position_ids: Tensor,
    /// Stacked per-slot label indices, -1 on padding slots
    pub labels: Tensor,
    /// Source document index per example
    pub doc_indices: Vec<usize>,
    /// Gold sub-token spans per example
    pub gold_spans: Vec<Vec<(usize, usize)>>,
}

impl NerBatch {
    /// Stack a list of examples into one batch.
    ///
    /// With `cut_extra_padding`, the entity dimension is narrowed to the
    /// batch's maximum occupied slot count, trading the configured ceiling
    /// for less wasted compute downstream.
    pub fn collate(examples: &[NerExample], cut_extra_padding: bool) -> Result<Self> {
        if examples.is_empty() {
            return Err(Error::Tensor("cannot collate an empty batch".to_string()));
        }

        let stack = |tensors: Vec<&Tensor>| Tensor::stack(&tensors, 0).tensor_err();
        let mut batch = Self {
            word_ids: stack(examples.iter().map(|e| &e.words.ids).collect())?,
            word_segments: stack(examples.iter().map(|e| &e.words.segments).collect())?,
            word_attention_mask: stack(
                examples.iter().map(|e| &e.words.attention_mask).collect(),
            )?,
            entity_ids: stack(examples.iter().map(|e| &e.entities.ids).collect())?,
            entity_attention_mask: stack(
                examples.iter().map(|e| &e.entities.attention_mask).collect(),
            )?,
            entity_position_ids: stack(
                examples.iter().map(|e| &e.entities.position_ids).collect(),
            )?,
            labels: stack(examples.iter().map(|e| &e.labels).collect())?,
            doc_indices: examples.iter().map(|e| e.doc_index).collect(),
            gold_spans: examples.iter().map(|e| e.gold_spans.clone()).collect(),
        };

        if cut_extra_padding {
            let occupied = examples
                .iter()
                .map(|e| e.entities.count)
                .max()
                .unwrap_or(0)
                .max(1);
            let ceiling = batch.entity_ids.dims()[1];
            if occupied < ceiling {
                batch.entity_ids = batch.entity_ids.narrow(1, 0, occupied).tensor_err()?;
                batch.entity_attention_mask = batch
                    .entity_attention_mask
                    .narrow(1, 0, occupied)
                    .tensor_err()?;
                batch.entity_position_ids = batch
                    .entity_position_ids
                    .narrow(1, 0, occupied)
                    .tensor_err()?;
                batch.labels = batch.labels.narrow(1, 0, occupied).tensor_err()?;
            }
        }
        Ok(batch)
    }

    /// Number of examples in the batch
    pub fn len(&self) -> usize {
        self.doc_indices.len()
    }

    /// Whether the batch holds no examples
    pub fn is_empty(&self) -> bool {
        self.doc_indices.is_empty()
    }
}

/// Iterates built examples in collated batches, reshuffling per epoch.
///
/// The loader owns the run's random stream after example construction, so
/// epoch shuffles continue the same seeded sequence.
pub struct DataLoader {
    examples: Vec<NerExample>,
    batch_size: usize,
    shuffle: bool,
    cut_extra_padding: bool,
    position: usize,
    epoch: usize,
    rng: StdRng,
}

impl DataLoader {
    /// Create a loader over built examples
    pub fn new(
        examples: Vec<NerExample>,
        batch_size: usize,
        shuffle: bool,
        cut_extra_padding: bool,
        rng: StdRng,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::Configuration(
                "batch_size must be a positive integer".to_string(),
            ));
        }
        let mut loader = Self {
            examples,
            batch_size,
            shuffle,
            cut_extra_padding,
            position: 0,
            epoch: 0,
            rng,
        };
        if loader.shuffle {
            loader.examples.shuffle(&mut loader.rng);
        }
        Ok(loader)
    }

    /// Collate the next batch, or `None` at the end of the epoch
    pub fn next_batch(&mut self) -> Option<Result<NerBatch>> {
        if self.position >= self.examples.len() {
            return None;
        }
        let end = (self.position + self.batch_size).min(self.examples.len());
        let batch = NerBatch::collate(&self.examples[self.position..end], self.cut_extra_padding);
        self.position = end;
        Some(batch)
    }

    /// Rewind for the next epoch, reshuffling when enabled
    pub fn reset(&mut self) {
        self.position = 0;
        self.epoch += 1;
        if self.shuffle {
            self.examples.shuffle(&mut self.rng);
        }
    }

    /// Number of batches per epoch
    pub fn num_batches(&self) -> usize {
        self.examples.len().div_ceil(self.batch_size)
    }

    /// Number of examples
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the loader holds no examples
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Completed epoch count
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// The built examples, in current iteration order
    pub fn examples(&self) -> &[NerExample] {
        &self.examples
    }
}

impl Iterator for DataLoader {
    type Item = Result<NerBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch()
    }
}
