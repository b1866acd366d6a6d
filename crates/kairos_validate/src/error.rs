//! Error type for loading reference catalogues.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalogue parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("reference record {index} is invalid: {reason}")]
    InvalidRecord { index: usize, reason: &'static str },
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}
