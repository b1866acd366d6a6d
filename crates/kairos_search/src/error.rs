//! Error type for search and locator calls.
//!
//! Only caller-input problems and a provider that never answered are errors.
//! "Not found", skipped samples and truncated ranges are reported inside the
//! result values instead.

use kairos_core::ProviderError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SearchError {
    /// A static argument or config value is invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// The time range is empty or reversed.
    #[error("invalid range: start {start_jd} is after end {end_jd}")]
    InvalidRange { start_jd: f64, end_jd: f64 },
    /// The time range is longer than the configured maximum.
    #[error("range of {span_days:.1} days exceeds the maximum of {max_days:.1} days")]
    RangeTooLong { span_days: f64, max_days: f64 },
    /// The provider failed before a single result was produced.
    #[error("provider unavailable at JD {at_jd}: {message}")]
    ProviderUnavailable { at_jd: f64, message: String },
    /// A provider error outside any scan (e.g. during bisection).
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}
