//! Error type for cache operations.
//!
//! Callers of [`TieredCache`](crate::TieredCache) never see these for
//! get/put: a failing tier is logged and skipped. They surface only from
//! construction and from direct backend use.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("invalid cache config: {0}")]
    InvalidConfig(&'static str),
    /// The persistent tier could not be reached or answered garbage.
    #[error("cache tier unavailable: {0}")]
    Unavailable(String),
    /// The persistent tier did not answer within its time limit.
    #[error("cache tier timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
