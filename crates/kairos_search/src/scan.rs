//! Coarse forward scan shared by the transit, ingress and station locators.
//!
//! Samples a body on a fixed grid `start + k * step` (the last sample is
//! clamped to `end`) and hands each consecutive pair of good samples to the
//! locator. Failed samples are skipped; the next good sample pairs with the
//! last good one. When the provider supports batched queries the grid is
//! fetched in chunks; the samples are identical either way.

use std::collections::VecDeque;

use kairos_core::{Body, BodyPosition, Deadline, PositionProvider, ProviderError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SearchError;
use crate::event_types::{EventSearch, SearchNote, Truncation};

/// Sampling and fault-tolerance knobs for a coarse scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Consecutive failed samples after which the provider is deemed unavailable.
    pub max_consecutive_faults: u32,
    /// Use [`PositionProvider::positions`] when the provider supports it.
    pub vectorize: bool,
    /// Samples per batched provider call.
    pub vector_chunk: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_consecutive_faults: 16,
            vectorize: true,
            vector_chunk: 64,
        }
    }
}

impl ScanConfig {
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.max_consecutive_faults == 0 {
            return Err("max_consecutive_faults must be > 0");
        }
        if self.vector_chunk == 0 {
            return Err("vector_chunk must be > 0");
        }
        Ok(())
    }
}

/// One good coarse-scan sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Sample {
    pub jd: f64,
    pub pos: BodyPosition,
}

/// What a locator wants after looking at one pair of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Grid sampler with optional chunked prefetch.
struct Sampler<'a> {
    provider: &'a dyn PositionProvider,
    body: Body,
    start: f64,
    step: f64,
    end: f64,
    next_index: u64,
    exhausted: bool,
    chunk: usize,
    buffer: VecDeque<(f64, Result<BodyPosition, ProviderError>)>,
}

impl<'a> Sampler<'a> {
    fn new(
        provider: &'a dyn PositionProvider,
        body: Body,
        start: f64,
        end: f64,
        step: f64,
        config: &ScanConfig,
    ) -> Self {
        let chunk = if config.vectorize && provider.supports_vectorized() {
            config.vector_chunk
        } else {
            1
        };
        Self {
            provider,
            body,
            start,
            step,
            end,
            next_index: 0,
            exhausted: false,
            chunk,
            buffer: VecDeque::with_capacity(chunk),
        }
    }

    fn next_epoch(&mut self) -> Option<f64> {
        if self.exhausted {
            return None;
        }
        // Multiply rather than accumulate so every mode sees the same grid.
        let t = self.start + self.next_index as f64 * self.step;
        self.next_index += 1;
        if t >= self.end {
            self.exhausted = true;
            Some(self.end)
        } else {
            Some(t)
        }
    }

    fn refill(&mut self) {
        let mut epochs = Vec::with_capacity(self.chunk);
        while epochs.len() < self.chunk {
            match self.next_epoch() {
                Some(t) => epochs.push(t),
                None => break,
            }
        }
        if epochs.is_empty() {
            return;
        }

        if self.chunk == 1 {
            let t = epochs[0];
            self.buffer.push_back((t, self.provider.position(self.body, t)));
            return;
        }

        let results = self.provider.positions(self.body, &epochs);
        if results.len() == epochs.len() {
            self.buffer.extend(epochs.into_iter().zip(results));
        } else {
            self.buffer.extend(epochs.into_iter().map(|t| {
                (
                    t,
                    Err(ProviderError::Fault(
                        "batched query returned the wrong number of samples".into(),
                    )),
                )
            }));
        }
    }
}

impl Iterator for Sampler<'_> {
    type Item = (f64, Result<BodyPosition, ProviderError>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            self.refill();
        }
        self.buffer.pop_front()
    }
}

/// Scan `[start, end]` and call `on_pair` for each consecutive pair of good
/// samples. Returns why the scan stopped early, if it did.
#[allow(clippy::too_many_arguments)]
pub(crate) fn scan_pairs<F>(
    provider: &dyn PositionProvider,
    body: Body,
    start: f64,
    end: f64,
    step: f64,
    config: &ScanConfig,
    deadline: &Deadline,
    notes: &mut Vec<SearchNote>,
    mut on_pair: F,
) -> Option<Truncation>
where
    F: FnMut(&Sample, &Sample, &mut Vec<SearchNote>) -> Flow,
{
    let mut prev: Option<Sample> = None;
    let mut consecutive_faults = 0u32;

    for (jd, result) in Sampler::new(provider, body, start, end, step, config) {
        if deadline.is_expired() {
            let at_jd = prev.map_or(start, |p| p.jd);
            return Some(Truncation::DeadlineExceeded { at_jd });
        }
        match result {
            Ok(pos) => {
                consecutive_faults = 0;
                let curr = Sample { jd, pos };
                if let Some(p) = &prev
                    && on_pair(p, &curr, notes) == Flow::Stop
                {
                    return None;
                }
                prev = Some(curr);
            }
            Err(e) => {
                consecutive_faults += 1;
                warn!(?body, jd, error = %e, "skipping failed provider sample");
                let message = e.to_string();
                let fatal = matches!(
                    e,
                    ProviderError::Unavailable(_) | ProviderError::Unsupported(_)
                );
                notes.push(SearchNote::ProviderFault {
                    jd_tdb: jd,
                    message: message.clone(),
                });
                if fatal || consecutive_faults >= config.max_consecutive_faults {
                    return Some(Truncation::ProviderUnavailable { at_jd: jd, message });
                }
            }
        }
    }
    None
}

/// Package scan output. A scan that found nothing because the provider
/// never answered is an error; anything found before a failure is kept.
pub(crate) fn finish<E>(
    events: Vec<E>,
    notes: Vec<SearchNote>,
    truncation: Option<Truncation>,
) -> Result<EventSearch<E>, SearchError> {
    if events.is_empty()
        && let Some(Truncation::ProviderUnavailable { at_jd, message }) = &truncation
    {
        return Err(SearchError::ProviderUnavailable {
            at_jd: *at_jd,
            message: message.clone(),
        });
    }
    Ok(EventSearch {
        events,
        notes,
        truncation,
    })
}

/// Reject empty, reversed or non-finite ranges.
pub(crate) fn validate_range(start: f64, end: f64) -> Result<(), SearchError> {
    if !start.is_finite() || !end.is_finite() {
        return Err(SearchError::InvalidConfig("range bounds must be finite"));
    }
    if end <= start {
        return Err(SearchError::InvalidRange {
            start_jd: start,
            end_jd: end,
        });
    }
    Ok(())
}
