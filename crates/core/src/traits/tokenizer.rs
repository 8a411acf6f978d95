//! Sub-word tokenizer capability

use crate::error::Result;

/// Sub-word tokenizer capability.
///
/// The pipeline only needs per-word sub-token ids plus the three special
/// ids used when laying out the words tensor. Words are tokenized one at a
/// time so the word-to-sub-token provenance mapping stays exact.
pub trait SubwordTokenizer: Send + Sync {
    /// Sub-token ids for one word, without special tokens
    fn tokenize_word(&self, word: &str) -> Result<Vec<u32>>;

    /// Id of the separator token placed after the sub-tokens
    fn sep_id(&self) -> u32;

    /// Id of the start-of-sequence token placed before the sub-tokens
    fn cls_id(&self) -> u32;

    /// Id used for right padding
    fn pad_id(&self) -> u32;

    /// Sub-token ids for a word sequence
    fn tokenize_words(&self, words: &[String]) -> Result<Vec<Vec<u32>>> {
        words.iter().map(|word| self.tokenize_word(word)).collect()
    }
}

/// Deterministic byte-level tokenizer for testing.
///
/// Each byte becomes one sub-token, so multi-character words expand to
/// multiple sub-tokens the way real sub-word vocabularies do. Ids 0..=3
/// are reserved for the special tokens.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteTokenizer;

impl ByteTokenizer {
    const RESERVED: u32 = 4;
}

impl SubwordTokenizer for ByteTokenizer {
    fn tokenize_word(&self, word: &str) -> Result<Vec<u32>> {
        Ok(word
            .bytes()
            .map(|byte| byte as u32 + Self::RESERVED)
            .collect())
    }

    fn sep_id(&self) -> u32 {
        3
    }

    fn cls_id(&self) -> u32 {
        2
    }

    fn pad_id(&self) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_tokenizer_expands_words() {
        let tokenizer = ByteTokenizer;
        let ids = tokenizer.tokenize_word("abc").unwrap();
        assert_eq!(ids, vec![b'a' as u32 + 4, b'b' as u32 + 4, b'c' as u32 + 4]);
    }

    #[test]
    fn test_byte_tokenizer_ids_avoid_specials() {
        let tokenizer = ByteTokenizer;
        let ids = tokenizer.tokenize_word("\0\x01").unwrap();
        for id in ids {
            assert!(id != tokenizer.pad_id());
            assert!(id != tokenizer.cls_id());
            assert!(id != tokenizer.sep_id());
        }
    }

    #[test]
    fn test_tokenize_words_keeps_word_alignment() {
        let tokenizer = ByteTokenizer;
        let words = vec!["hi".to_string(), "there".to_string()];
        let ids = tokenizer.tokenize_words(&words).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].len(), 2);
        assert_eq!(ids[1].len(), 5);
    }
}
