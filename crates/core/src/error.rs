//! Core error types for spanprep

use std::str::FromStr;

/// Result type alias for spanprep
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Device tensors are placed on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Device {
    Cpu,
    Gpu(u32),
    Metal,
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cpu" => Ok(Self::Cpu),
            "metal" => Ok(Self::Metal),
            _ => {
                let id = s
                    .strip_prefix("cuda:")
                    .or_else(|| s.strip_prefix("gpu:"))
                    .and_then(|id| id.parse().ok());
                match id {
                    Some(id) => Ok(Self::Gpu(id)),
                    None => Err(Error::Configuration(format!(
                        "unknown device identifier: {s:?} (expected cpu, cuda:N or metal)"
                    ))),
                }
            }
        }
    }
}

/// Core error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed annotation: {0}")]
    Annotation(String),

    #[error("span limit exceeded: {0}")]
    SpanLimit(String),

    #[error("sequence limit exceeded: {0}")]
    SequenceLimit(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("tokenization error: {0}")]
    Tokenization(String),

    #[error("entity vocabulary error: {0}")]
    Vocab(String),

    #[error("tensor error: {0}")]
    Tensor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for Error {
    fn from(err: bincode::error::EncodeError) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for Error {
    fn from(err: bincode::error::DecodeError) -> Self {
        Error::Serialization(err.to_string())
    }
}
