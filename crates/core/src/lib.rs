//! spanprep core library
//!
//! Prepares entity-span training examples for span-based NER models
//! operating on sub-word-tokenized text: IOB2 decoding, length-driven
//! sentence splitting, candidate-span sampling, and padded tensor batch
//! construction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod data;
pub mod error;
pub mod ner;
pub mod tokenizer;
pub mod traits;

pub use config::DataConfig;
pub use error::{Device, Error, Result};

pub use data::*;
pub use ner::*;
pub use tokenizer::HfTokenizer;
pub use traits::*;
