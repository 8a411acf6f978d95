//! Candidate span enumeration and sampling

use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// Cumulative sub-token lengths per word: `cumlength[k]` is the number of
/// sub-tokens in words `0..=k`.
pub fn cumulative_lengths(token_counts: &[usize]) -> Vec<usize> {
    let mut total = 0;
    token_counts
        .iter()
        .map(|count| {
            total += count;
            total
        })
        .collect()
}

/// Sub-token index at which word `k` starts
fn word_offset(cumlength: &[usize], k: usize) -> usize {
    if k == 0 {
        0
    } else {
        cumlength[k - 1]
    }
}

/// Convert half-open word-index spans into half-open sub-token spans
pub fn to_subtoken_spans(
    word_spans: &BTreeMap<(usize, usize), String>,
    cumlength: &[usize],
) -> BTreeMap<(usize, usize), String> {
    word_spans
        .iter()
        .map(|(&(start, end), typ)| {
            (
                (word_offset(cumlength, start), cumlength[end - 1]),
                typ.clone(),
            )
        })
        .collect()
}

/// Enumerates candidate spans for a segment and samples the negative fill.
#[derive(Clone, Copy, Debug)]
pub struct SpanSampler {
    max_entities: usize,
    max_entity_span: usize,
}

impl SpanSampler {
    /// Create a sampler with the configured per-example limits
    pub fn new(max_entities: usize, max_entity_span: usize) -> Self {
        Self {
            max_entities,
            max_entity_span,
        }
    }

    /// Gold spans plus sampled negatives, in sub-token coordinates.
    ///
    /// All word-aligned sub-token spans of at most `max_entity_span`
    /// sub-tokens are enumerated, the gold spans among them are set aside,
    /// and a uniformly shuffled prefix of the rest fills the candidate set
    /// up to `max_entities`. Gold spans are appended unconditionally, so
    /// they survive truncation for every seed. Negatives come first in the
    /// returned order; callers must not assume any (start, end) ordering.
    pub fn sample(
        &self,
        gold: &BTreeMap<(usize, usize), String>,
        cumlength: &[usize],
        doc_index: usize,
        segment_index: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<(usize, usize)>> {
        for &(start, end) in gold.keys() {
            if end - start > self.max_entity_span {
                return Err(Error::SpanLimit(format!(
                    "document {doc_index}, segment {segment_index}: gold span ({start}, {end}) \
                     is {} sub-tokens long, limit is {}",
                    end - start,
                    self.max_entity_span
                )));
            }
        }
        if gold.len() >= self.max_entities {
            return Err(Error::SpanLimit(format!(
                "document {doc_index}, segment {segment_index}: {} gold spans, \
                 but only {} candidate slots are allowed",
                gold.len(),
                self.max_entities
            )));
        }

        // Word boundaries in sub-token coordinates; every candidate is a
        // pair of distinct boundaries. Words with no sub-tokens produce
        // duplicate boundary values, hence the dedup.
        let mut boundaries = Vec::with_capacity(cumlength.len() + 1);
        boundaries.push(0);
        boundaries.extend_from_slice(cumlength);

        let mut negatives = Vec::new();
        for i in 0..boundaries.len() {
            for j in i + 1..boundaries.len() {
                let span = (boundaries[i], boundaries[j]);
                if span.0 >= span.1 || span.1 - span.0 > self.max_entity_span {
                    continue;
                }
                if gold.contains_key(&span) {
                    continue;
                }
                negatives.push(span);
            }
        }
        negatives.sort_unstable();
        negatives.dedup();

        negatives.shuffle(rng);
        negatives.truncate(self.max_entities - gold.len());
        negatives.extend(gold.keys().copied());
        Ok(negatives)
    }
}
