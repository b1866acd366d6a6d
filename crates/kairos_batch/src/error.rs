//! Error types for batch construction and individual batch slots.

use thiserror::Error;

/// Why one slot of a batch produced no value. Never affects other slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SlotError {
    /// The request itself returned an error.
    #[error("request failed: {0}")]
    Failed(String),
    /// The request ran past its per-slot limit.
    #[error("slot timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    /// The batch deadline passed before the request finished.
    #[error("batch deadline passed before the slot completed")]
    BatchTimeout,
    /// The request panicked.
    #[error("request panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BatchError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
