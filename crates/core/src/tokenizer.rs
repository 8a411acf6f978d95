//! Tokenizer integration using the `tokenizers` crate

use crate::error::{Error, Result};
use crate::traits::tokenizer::SubwordTokenizer;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

/// Special-token surface forms probed when resolving ids, in order
const SEP_TOKENS: [&str; 2] = ["[SEP]", "</s>"];
const CLS_TOKENS: [&str; 2] = ["[CLS]", "<s>"];
const PAD_TOKENS: [&str; 2] = ["[PAD]", "<pad>"];

/// Hugging Face tokenizer wrapper.
///
/// Tokenizes one word at a time without special tokens, so the word to
/// sub-token provenance mapping the pipeline depends on stays exact. The
/// separator, start and pad ids are resolved once at construction.
#[derive(Clone)]
pub struct HfTokenizer {
    inner: Arc<Tokenizer>,
    sep_id: u32,
    cls_id: u32,
    pad_id: u32,
}

impl HfTokenizer {
    /// Load from a `tokenizer.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path.as_ref()).map_err(|e| {
            Error::Tokenization(format!(
                "failed to load tokenizer from {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_tokenizer(tokenizer)
    }

    /// Load from a local model directory, or download from the HF Hub when
    /// the path does not exist locally
    pub fn from_pretrained(path: impl AsRef<str>) -> Result<Self> {
        let path = path.as_ref();
        if Path::new(path).exists() {
            return Self::from_file(Path::new(path).join("tokenizer.json"));
        }
        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| Error::Tokenization(format!("failed to create HF API: {e}")))?;
        let tokenizer_path = api
            .model(path.to_string())
            .get("tokenizer.json")
            .map_err(|e| {
                Error::Tokenization(format!("failed to get tokenizer for {path}: {e}"))
            })?;
        Self::from_file(tokenizer_path)
    }

    /// Wrap an already-constructed tokenizer
    pub fn from_tokenizer(tokenizer: Tokenizer) -> Result<Self> {
        let sep_id = resolve_special(&tokenizer, &SEP_TOKENS)?;
        let cls_id = resolve_special(&tokenizer, &CLS_TOKENS)?;
        let pad_id = resolve_special(&tokenizer, &PAD_TOKENS)?;
        Ok(Self {
            inner: Arc::new(tokenizer),
            sep_id,
            cls_id,
            pad_id,
        })
    }

    /// The underlying tokenizer
    pub fn inner(&self) -> &Tokenizer {
        &self.inner
    }
}

fn resolve_special(tokenizer: &Tokenizer, candidates: &[&str]) -> Result<u32> {
    candidates
        .iter()
        .find_map(|token| tokenizer.token_to_id(token))
        .ok_or_else(|| {
            Error::Tokenization(format!(
                "none of the special tokens {candidates:?} exist in the vocabulary"
            ))
        })
}

impl SubwordTokenizer for HfTokenizer {
    fn tokenize_word(&self, word: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(word, false)
            .map_err(|e| Error::Tokenization(format!("failed to encode {word:?}: {e}")))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn sep_id(&self) -> u32 {
        self.sep_id
    }

    fn cls_id(&self) -> u32 {
        self.cls_id
    }

    fn pad_id(&self) -> u32 {
        self.pad_id
    }
}
