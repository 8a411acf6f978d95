//! Tensor layout for words and candidate spans

use crate::config::DataConfig;
use crate::data::vocab::EntityVocab;
use crate::error::{Device, Error, Result};
use crate::ner::span::{cumulative_lengths, to_subtoken_spans};
use crate::traits::tokenizer::SubwordTokenizer;
use candle_core::{DType, Device as CandleDevice, Tensor};
use std::collections::BTreeMap;

/// Convert a [`Tensor`] result into a spanprep result
pub(crate) trait TensorResultExt<T> {
    fn tensor_err(self) -> Result<T>;
}

impl<T> TensorResultExt<T> for candle_core::Result<T> {
    fn tensor_err(self) -> Result<T> {
        self.map_err(|e| Error::Tensor(e.to_string()))
    }
}

/// Resolve the configured device to a candle device.
///
/// An unavailable accelerator is a configuration error, not a silent CPU
/// fallback.
pub fn to_candle_device(device: &Device) -> Result<CandleDevice> {
    match device {
        Device::Cpu => Ok(CandleDevice::Cpu),
        Device::Gpu(id) => CandleDevice::new_cuda(*id as usize)
            .map_err(|e| Error::Configuration(format!("cuda:{id} unavailable: {e}"))),
        Device::Metal => CandleDevice::new_metal(0)
            .map_err(|e| Error::Configuration(format!("metal unavailable: {e}"))),
    }
}

/// The words tensor group of one example.
///
/// All tensors are i64 of length `max_seq_length`.
#[derive(Clone, Debug)]
pub struct Words {
    /// Sub-token ids: CLS, the sub-tokens, SEP, then PAD
    pub ids: Tensor,
    /// Segment type ids, all zero (single-segment model)
    pub segments: Tensor,
    /// 1 for real and sentinel tokens, 0 for padding
    pub attention_mask: Tensor,
}

impl Words {
    /// Lay out a flat sub-token sequence with sentinels and right padding
    pub fn build(
        subtokens: &[u32],
        max_len: usize,
        cls_id: u32,
        sep_id: u32,
        pad_id: u32,
        device: &CandleDevice,
    ) -> Result<Self> {
        if subtokens.len() + 2 > max_len {
            return Err(Error::SequenceLimit(format!(
                "{} sub-tokens plus the two sentinels exceed max_seq_length {max_len}",
                subtokens.len()
            )));
        }
        let mut ids: Vec<i64> = Vec::with_capacity(max_len);
        ids.push(cls_id as i64);
        ids.extend(subtokens.iter().map(|&id| id as i64));
        ids.push(sep_id as i64);
        let occupied = ids.len();
        ids.resize(max_len, pad_id as i64);

        let mut mask = vec![1i64; occupied];
        mask.resize(max_len, 0);

        Ok(Self {
            ids: Tensor::from_vec(ids, (max_len,), device).tensor_err()?,
            segments: Tensor::zeros((max_len,), DType::I64, device).tensor_err()?,
            attention_mask: Tensor::from_vec(mask, (max_len,), device).tensor_err()?,
        })
    }
}

/// The entities tensor group of one example.
///
/// `ids` and `attention_mask` are i64 of length `max_entities`;
/// `position_ids` is i64 of shape `max_entities × max_entity_span`.
#[derive(Clone, Debug)]
pub struct Entities {
    /// Entity vocabulary ids per span slot
    pub ids: Tensor,
    /// 1 for real span slots, 0 for padding slots
    pub attention_mask: Tensor,
    /// Per span slot, the positions of its sub-tokens inside the words ids
    /// tensor (offset one past the CLS sentinel), right-padded with -1
    pub position_ids: Tensor,
    /// Number of real span slots
    pub count: usize,
}

impl Entities {
    /// Lay out candidate spans into fixed-shape, -1-padded tensors.
    ///
    /// After this step the position matrix is the only place span geometry
    /// is recoverable; slot order follows the sampled candidate order, not
    /// (start, end) order.
    pub fn build(
        entity_ids: &[u32],
        spans: &[(usize, usize)],
        max_entities: usize,
        max_entity_span: usize,
        device: &CandleDevice,
    ) -> Result<Self> {
        if entity_ids.len() != spans.len() {
            return Err(Error::Tensor(format!(
                "{} entity ids for {} spans",
                entity_ids.len(),
                spans.len()
            )));
        }
        if spans.len() > max_entities {
            return Err(Error::SpanLimit(format!(
                "{} candidate spans, but only {max_entities} slots are allowed",
                spans.len()
            )));
        }

        let count = spans.len();
        let mut ids: Vec<i64> = entity_ids.iter().map(|&id| id as i64).collect();
        ids.resize(max_entities, 0);

        let mut mask = vec![1i64; count];
        mask.resize(max_entities, 0);

        let mut positions = vec![-1i64; max_entities * max_entity_span];
        for (slot, &(start, end)) in spans.iter().enumerate() {
            if end.saturating_sub(start) > max_entity_span {
                return Err(Error::SpanLimit(format!(
                    "span ({start}, {end}) is {} sub-tokens long, limit is {max_entity_span}",
                    end - start
                )));
            }
            for (k, position) in (start..end).enumerate() {
                // +1 steps over the CLS sentinel in the words tensor
                positions[slot * max_entity_span + k] = (position + 1) as i64;
            }
        }

        Ok(Self {
            ids: Tensor::from_vec(ids, (max_entities,), device).tensor_err()?,
            attention_mask: Tensor::from_vec(mask, (max_entities,), device).tensor_err()?,
            position_ids: Tensor::from_vec(positions, (max_entities, max_entity_span), device)
                .tensor_err()?,
            count,
        })
    }
}

/// One segment's training example: tensors plus bookkeeping.
///
/// Immutable once built; owned by the dataset until collated.
#[derive(Clone, Debug)]
pub struct NerExample {
    /// Words tensor group
    pub words: Words,
    /// Entities tensor group
    pub entities: Entities,
    /// Per-slot label indices, -1 on padding slots
    pub labels: Tensor,
    /// Gold spans in sub-token coordinates, ordered by start
    pub gold_spans: Vec<(usize, usize)>,
    /// Index of the document this segment came from
    pub doc_index: usize,
}

/// Encode a word sequence with *known* entity spans for prediction-time use.
///
/// Unlike training construction, span slots carry the entity vocabulary id
/// of their surface form (the unknown id when absent) and no negatives are
/// sampled. Spans are given in half-open word coordinates.
pub fn features_from_words(
    words: &[String],
    spans: &[(usize, usize)],
    vocab: &EntityVocab,
    tokenizer: &dyn SubwordTokenizer,
    config: &DataConfig,
) -> Result<(Words, Entities)> {
    config.validate()?;
    let device = to_candle_device(&config.device)?;

    let token_ids = tokenizer.tokenize_words(words)?;
    let counts: Vec<usize> = token_ids.iter().map(Vec::len).collect();
    let cumlength = cumulative_lengths(&counts);

    let word_spans: BTreeMap<(usize, usize), String> = spans
        .iter()
        .map(|&(start, end)| {
            if start >= end || end > words.len() {
                return Err(Error::Annotation(format!(
                    "span ({start}, {end}) does not fit a {}-word sequence",
                    words.len()
                )));
            }
            Ok(((start, end), words[start..end].join(" ")))
        })
        .collect::<Result<_>>()?;
    if word_spans.len() > config.max_entities {
        return Err(Error::SpanLimit(format!(
            "{} spans, but only {} slots are allowed",
            word_spans.len(),
            config.max_entities
        )));
    }

    let subtoken_spans = to_subtoken_spans(&word_spans, &cumlength);
    let span_list: Vec<(usize, usize)> = subtoken_spans.keys().copied().collect();
    let entity_ids: Vec<u32> = subtoken_spans
        .values()
        .map(|surface| vocab.id(surface))
        .collect();

    let flat: Vec<u32> = token_ids.into_iter().flatten().collect();
    let words_group = Words::build(
        &flat,
        config.max_seq_length,
        tokenizer.cls_id(),
        tokenizer.sep_id(),
        tokenizer.pad_id(),
        &device,
    )?;
    let entities = Entities::build(
        &entity_ids,
        &span_list,
        config.max_entities,
        config.max_entity_span,
        &device,
    )?;
    Ok((words_group, entities))
}
