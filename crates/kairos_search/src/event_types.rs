//! Shared result envelope for locator calls.

use serde::{Deserialize, Serialize};

/// Something a scan skipped or could not resolve. Never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchNote {
    /// A provider sample failed and was skipped.
    ProviderFault { jd_tdb: f64, message: String },
    /// A bracket was found but bisection did not converge.
    SearchExhausted {
        lower_jd: f64,
        upper_jd: f64,
        achieved_precision: f64,
    },
}

/// Why a scan stopped before covering its whole range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Truncation {
    /// The caller's deadline passed.
    DeadlineExceeded { at_jd: f64 },
    /// The provider stopped answering.
    ProviderUnavailable { at_jd: f64, message: String },
}

impl Truncation {
    pub fn at_jd(&self) -> f64 {
        match self {
            Self::DeadlineExceeded { at_jd } | Self::ProviderUnavailable { at_jd, .. } => *at_jd,
        }
    }
}

/// Events found by a locator, chronological, plus anything worth knowing
/// about how they were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSearch<E> {
    pub events: Vec<E>,
    pub notes: Vec<SearchNote>,
    /// Set when the range was not fully covered; `events` are still valid.
    pub truncation: Option<Truncation>,
}

impl<E> Default for EventSearch<E> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            notes: Vec::new(),
            truncation: None,
        }
    }
}

impl<E> EventSearch<E> {
    /// Whether the search covered its range without skipping anything.
    /// Only complete results are safe to cache.
    pub fn is_complete(&self) -> bool {
        self.truncation.is_none() && self.notes.is_empty()
    }

    pub fn first(&self) -> Option<&E> {
        self.events.first()
    }
}
