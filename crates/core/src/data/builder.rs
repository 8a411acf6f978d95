//! Per-document example assembly

use crate::config::DataConfig;
use crate::data::boundaries::extend_sentence_bounds;
use crate::data::conll::Corpus;
use crate::data::example::{to_candle_device, Entities, NerExample, TensorResultExt, Words};
use crate::data::vocab::EntityVocab;
use crate::error::{Error, Result};
use crate::ner::iob::segment_entities;
use crate::ner::span::{cumulative_lengths, to_subtoken_spans, SpanSampler};
use crate::traits::tokenizer::SubwordTokenizer;
use candle_core::{Device as CandleDevice, Tensor};
use rand::rngs::StdRng;
use spanprep_utils::ProgressReporter;
use std::collections::HashMap;

/// Builds span training examples from annotated documents.
///
/// Holds only read-only configuration; the random stream for negative
/// sampling is threaded through explicitly so a run's examples are
/// reproducible from one seed.
pub struct ExampleBuilder<'a> {
    config: DataConfig,
    tokenizer: &'a dyn SubwordTokenizer,
    sampler: SpanSampler,
    device: CandleDevice,
    unknown_entity_id: u32,
    null_label: String,
    label_to_idx: HashMap<String, i64>,
}

impl<'a> ExampleBuilder<'a> {
    /// Create a builder; fails on an invalid configuration before any data
    /// is touched.
    pub fn new(
        config: DataConfig,
        tokenizer: &'a dyn SubwordTokenizer,
        vocab: &EntityVocab,
        null_label: &str,
        labels: &[String],
    ) -> Result<Self> {
        config.validate()?;
        let device = to_candle_device(&config.device)?;

        let mut label_to_idx = HashMap::new();
        label_to_idx.insert(null_label.to_string(), 0);
        for (i, label) in labels.iter().enumerate() {
            label_to_idx.insert(label.clone(), (i + 1) as i64);
        }

        Ok(Self {
            sampler: SpanSampler::new(config.max_entities, config.max_entity_span),
            device,
            unknown_entity_id: vocab.unknown_id(),
            null_label: null_label.to_string(),
            label_to_idx,
            config,
            tokenizer,
        })
    }

    /// Build one example per segment of a document.
    ///
    /// `sentence_bounds` are cumulative word-index sentence ends; extra
    /// boundaries are inserted wherever a sentence exceeds the sequence
    /// length limit.
    pub fn build_document(
        &self,
        doc_index: usize,
        words: &[String],
        tags: &[String],
        sentence_bounds: &[usize],
        rng: &mut StdRng,
    ) -> Result<Vec<NerExample>> {
        if words.len() != tags.len() {
            return Err(Error::Annotation(format!(
                "document {doc_index}: {} words but {} tags",
                words.len(),
                tags.len()
            )));
        }
        let covers_words = sentence_bounds.last().copied().unwrap_or(0) == words.len();
        if !covers_words || !sentence_bounds.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(Error::Annotation(format!(
                "document {doc_index}: sentence bounds must increase and cover all {} words",
                words.len()
            )));
        }

        let token_ids = self.tokenizer.tokenize_words(words)?;
        let counts: Vec<usize> = token_ids.iter().map(Vec::len).collect();
        let bounds = extend_sentence_bounds(sentence_bounds, &counts, self.config.max_seq_length)?;

        let mut examples = Vec::with_capacity(bounds.len());
        for (j, &end) in bounds.iter().enumerate() {
            let start = if j == 0 { 0 } else { bounds[j - 1] };

            let gold_words = segment_entities(&tags[start..end], &self.null_label)
                .map_err(|e| annotate_context(e, doc_index, j))?;
            let cumlength = cumulative_lengths(&counts[start..end]);
            let gold = to_subtoken_spans(&gold_words, &cumlength);

            let spans = self.sampler.sample(&gold, &cumlength, doc_index, j, rng)?;
            let entity_ids = vec![self.unknown_entity_id; spans.len()];

            let mut labels = Vec::with_capacity(self.config.max_entities);
            for span in &spans {
                let label = match gold.get(span) {
                    Some(typ) => *self.label_to_idx.get(typ).ok_or_else(|| {
                        Error::Annotation(format!(
                            "document {doc_index}, segment {j}: unknown entity type {typ:?}"
                        ))
                    })?,
                    None => 0,
                };
                labels.push(label);
            }
            labels.resize(self.config.max_entities, -1);

            let flat: Vec<u32> = token_ids[start..end]
                .iter()
                .flatten()
                .copied()
                .collect();
            let words_group = Words::build(
                &flat,
                self.config.max_seq_length,
                self.tokenizer.cls_id(),
                self.tokenizer.sep_id(),
                self.tokenizer.pad_id(),
                &self.device,
            )?;
            let entities = Entities::build(
                &entity_ids,
                &spans,
                self.config.max_entities,
                self.config.max_entity_span,
                &self.device,
            )?;
            let labels = Tensor::from_vec(labels, (self.config.max_entities,), &self.device)
                .tensor_err()?;

            examples.push(NerExample {
                words: words_group,
                entities,
                labels,
                gold_spans: gold.keys().copied().collect(),
                doc_index,
            });
        }
        Ok(examples)
    }

    /// Build examples for a whole corpus, one document per sentence.
    pub fn build_corpus(&self, corpus: &Corpus, rng: &mut StdRng) -> Result<Vec<NerExample>> {
        let mut progress = ProgressReporter::new("building examples", corpus.len());
        let mut examples = Vec::with_capacity(corpus.len());
        for (i, sentence) in corpus.sentences.iter().enumerate() {
            let bounds = [sentence.words.len()];
            examples.extend(self.build_document(
                i,
                &sentence.words,
                &sentence.tags,
                &bounds,
                rng,
            )?);
            progress.tick();
        }
        tracing::info!(
            documents = corpus.len(),
            examples = examples.len(),
            "corpus construction finished"
        );
        Ok(examples)
    }
}

fn annotate_context(err: Error, doc_index: usize, segment_index: usize) -> Error {
    match err {
        Error::Annotation(message) => Error::Annotation(format!(
            "document {doc_index}, segment {segment_index}: {message}"
        )),
        other => other,
    }
}
