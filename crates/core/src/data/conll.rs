//! CoNLL-style corpora

use crate::config::DataConfig;
use crate::data::batch::DataLoader;
use crate::data::builder::ExampleBuilder;
use crate::data::vocab::EntityVocab;
use crate::error::{Error, Result};
use crate::ner::iob::type_distribution;
use crate::traits::dataset::{NerDataset, Split};
use crate::traits::tokenizer::SubwordTokenizer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use spanprep_utils::{ensure_parent_dir, file_size, format_bytes};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One annotated sentence: words paired with IOB2 tags
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// The sentence's words
    pub words: Vec<String>,
    /// One IOB2 tag per word
    pub tags: Vec<String>,
}

/// An annotated corpus split
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    /// The split's sentences
    pub sentences: Vec<Sentence>,
}

impl Corpus {
    /// Parse CoNLL-style text: one `word tag` pair per line, sentences
    /// separated by blank lines, `-DOCSTART-` markers skipped.
    pub fn parse_conll(text: &str) -> Result<Self> {
        let mut sentences = Vec::new();
        let mut words = Vec::new();
        let mut tags = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                if !words.is_empty() {
                    sentences.push(Sentence {
                        words: std::mem::take(&mut words),
                        tags: std::mem::take(&mut tags),
                    });
                }
                continue;
            }
            if line.starts_with("-DOCSTART-") {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(word), Some(tag)) = (fields.next(), fields.next_back()) else {
                return Err(Error::Annotation(format!(
                    "line {}: expected `word tag`, got {line:?}",
                    number + 1
                )));
            };
            words.push(word.to_string());
            tags.push(tag.to_string());
        }
        if !words.is_empty() {
            sentences.push(Sentence { words, tags });
        }
        Ok(Self { sentences })
    }

    /// Load a CoNLL-format file
    pub fn load_conll(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_conll(&std::fs::read_to_string(path.as_ref())?)
    }

    /// Load from JSON
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save to JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), size = %saved_size(path), "saved corpus");
        Ok(())
    }

    /// Load from the binary format
    pub fn load_binary(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Ok(bincode::serde::decode_from_slice(&data, bincode::config::standard())?.0)
    }

    /// Save to the binary format
    pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let data = bincode::serde::encode_to_vec(self, bincode::config::standard())?;
        std::fs::write(path, data)?;
        tracing::debug!(path = %path.display(), size = %saved_size(path), "saved corpus");
        Ok(())
    }

    /// Number of sentences
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// Whether the corpus has no sentences
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Entity counts per type across the corpus
    pub fn type_distribution(&self, null_label: &str) -> Result<BTreeMap<String, usize>> {
        let annotations: Vec<Vec<String>> = self
            .sentences
            .iter()
            .map(|sentence| sentence.tags.clone())
            .collect();
        type_distribution(&annotations, null_label)
    }
}

fn saved_size(path: &Path) -> String {
    file_size(path).map(format_bytes).unwrap_or_default()
}

/// Default entity types of the bundled CoNLL corpus flavor
pub const CONLL_LABELS: [&str; 4] = ["LOC", "PER", "ORG", "MISC"];

/// A corpus of CoNLL-format files, one per split (`train.txt`, `dev.txt`,
/// `test.txt`), where each sentence is its own document.
///
/// Sentence-to-document grouping is not available in this corpus format,
/// so no cross-sentence context survives into the examples.
pub struct ConllDataset {
    root: PathBuf,
    config: DataConfig,
    tokenizer: Arc<dyn SubwordTokenizer>,
    vocab: EntityVocab,
    null_label: String,
    labels: Vec<String>,
}

impl ConllDataset {
    /// Create a dataset over a directory of split files
    pub fn new(
        root: impl Into<PathBuf>,
        config: DataConfig,
        tokenizer: Arc<dyn SubwordTokenizer>,
        vocab: EntityVocab,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            root: root.into(),
            config,
            tokenizer,
            vocab,
            null_label: "O".to_string(),
            labels: CONLL_LABELS.iter().map(|label| label.to_string()).collect(),
        })
    }

    /// Replace the default label set
    pub fn with_labels(
        mut self,
        null_label: impl Into<String>,
        labels: impl IntoIterator<Item = String>,
    ) -> Self {
        self.null_label = null_label.into();
        self.labels = labels.into_iter().collect();
        self
    }

    /// Path of a split's corpus file
    pub fn split_path(&self, split: Split) -> PathBuf {
        self.root.join(format!("{}.txt", split.as_str()))
    }
}

impl NerDataset for ConllDataset {
    fn null_label(&self) -> &str {
        &self.null_label
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn build(&self, split: Split, batch_size: usize) -> Result<DataLoader> {
        let corpus = Corpus::load_conll(self.split_path(split))?;
        tracing::info!(
            split = split.as_str(),
            sentences = corpus.len(),
            "loaded corpus"
        );

        let builder = ExampleBuilder::new(
            self.config.clone(),
            self.tokenizer.as_ref(),
            &self.vocab,
            &self.null_label,
            &self.labels,
        )?;
        // One random stream per run: example construction draws first,
        // epoch shuffles continue the same sequence inside the loader.
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let examples = builder.build_corpus(&corpus, &mut rng)?;
        DataLoader::new(
            examples,
            batch_size,
            split == Split::Train,
            self.config.cut_extra_padding,
            rng,
        )
    }
}
