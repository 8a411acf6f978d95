//! Shared test fixtures
#![allow(dead_code)]

use spanprep_core::{ByteTokenizer, DataConfig, EntityVocab, ExampleBuilder};
use std::collections::HashMap;

/// Limits small enough to exercise padding and sampling
pub fn test_config() -> DataConfig {
    DataConfig::new()
        .with_max_seq_length(32)
        .with_max_entities(8)
        .with_max_entity_span(6)
}

/// Vocabulary with one known surface form next to the unknown entry
pub fn test_vocab() -> EntityVocab {
    let mut entries = HashMap::new();
    entries.insert("[UNK]".to_string(), 1);
    entries.insert("Danmark".to_string(), 42);
    EntityVocab::new(entries).unwrap()
}

/// The standard CoNLL label set
pub fn test_labels() -> Vec<String> {
    ["LOC", "PER", "ORG", "MISC"]
        .iter()
        .map(|label| label.to_string())
        .collect()
}

pub fn strings(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Builder over the byte tokenizer with the test label set
pub fn test_builder(config: DataConfig) -> ExampleBuilder<'static> {
    static TOKENIZER: ByteTokenizer = ByteTokenizer;
    ExampleBuilder::new(config, &TOKENIZER, &test_vocab(), "O", &test_labels()).unwrap()
}

/// Recover (start, end) sub-token spans from the first `count` rows of a
/// position matrix, in slot order, undoing the one-past-CLS offset
pub fn spans_from_positions(positions: &[Vec<i64>], count: usize) -> Vec<(usize, usize)> {
    positions
        .iter()
        .take(count)
        .map(|row| {
            let real: Vec<i64> = row.iter().copied().filter(|&p| p >= 0).collect();
            let start = real.first().map(|&p| p as usize - 1).unwrap_or(0);
            (start, start + real.len())
        })
        .collect()
}
