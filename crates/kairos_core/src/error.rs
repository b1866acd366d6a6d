//! Error type for position provider calls.

use thiserror::Error;

/// Conditions a position provider may raise.
///
/// `Fault` is per-sample: a locator skips the sample and keeps scanning.
/// `Unavailable` means the provider cannot answer at all right now.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// A single evaluation failed.
    #[error("provider fault: {0}")]
    Fault(String),
    /// The provider is down or not loaded.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The provider does not implement this primitive.
    #[error("unsupported provider primitive: {0}")]
    Unsupported(&'static str),
    /// The epoch is outside the provider's coverage.
    #[error("epoch out of range: {jd_tdb}")]
    EpochOutOfRange { jd_tdb: f64 },
}

impl ProviderError {
    /// Whether retrying at a different epoch might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fault(_) | Self::EpochOutOfRange { .. })
    }
}
