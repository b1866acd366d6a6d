//! Rolling window of validation results and aggregate accuracy metrics.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ValidateError;
use crate::reference::ReferenceCatalogue;
use crate::validator::{ObservedEvent, ValidationResult, ValidatorConfig, validate};

/// The most recent `capacity` results, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationHistory {
    capacity: usize,
    results: VecDeque<ValidationResult>,
}

impl ValidationHistory {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            results: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: ValidationResult) {
        if self.results.len() == self.capacity {
            self.results.pop_front();
        }
        self.results.push_back(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub total: usize,
    pub passed: usize,
    /// `passed / total`, or 0 for an empty window.
    pub pass_rate: f64,
    /// Over results that had a reference.
    pub mean_timing_error_s: Option<f64>,
    pub max_timing_error_s: Option<f64>,
    pub mean_position_error_deg: Option<f64>,
    /// Results with no reference record in the window.
    pub missing_reference: usize,
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Aggregate the results currently in `history`.
pub fn generate_report(history: &ValidationHistory) -> AccuracyMetrics {
    let total = history.len();
    let passed = history.iter().filter(|r| r.is_valid).count();
    let timing: Vec<f64> = history.iter().filter_map(|r| r.timing_error_s).collect();
    let position: Vec<f64> = history.iter().filter_map(|r| r.position_error_deg).collect();
    AccuracyMetrics {
        total,
        passed,
        pass_rate: if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        },
        mean_timing_error_s: mean(&timing),
        max_timing_error_s: timing.iter().copied().reduce(f64::max),
        mean_position_error_deg: mean(&position),
        missing_reference: history.iter().filter(|r| !r.has_reference()).count(),
    }
}

/// A catalogue, its tolerances, and the rolling history of checks made
/// against it. Shared between threads.
#[derive(Debug)]
pub struct Validator {
    catalogue: Arc<ReferenceCatalogue>,
    config: ValidatorConfig,
    history: Mutex<ValidationHistory>,
}

impl Validator {
    pub fn new(
        catalogue: Arc<ReferenceCatalogue>,
        config: ValidatorConfig,
    ) -> Result<Self, ValidateError> {
        config.validate().map_err(ValidateError::InvalidConfig)?;
        Ok(Self {
            catalogue,
            history: Mutex::new(ValidationHistory::new(config.history_window)),
            config,
        })
    }

    pub fn catalogue(&self) -> &ReferenceCatalogue {
        &self.catalogue
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate and record the result in the history.
    pub fn validate(&self, event: &ObservedEvent) -> ValidationResult {
        let result = validate(event, &self.catalogue, &self.config);
        self.history.lock().push(result.clone());
        result
    }

    pub fn report(&self) -> AccuracyMetrics {
        generate_report(&self.history.lock())
    }

    pub fn reset_history(&self) {
        self.history.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::CheckKind;

    fn result(valid: bool, timing: Option<f64>) -> ValidationResult {
        ValidationResult {
            kind: CheckKind::Transit,
            is_valid: valid,
            timing_error_s: timing,
            position_error_deg: None,
            magnitude_error: None,
            reference_source: timing.map(|_| "r".to_owned()),
            reference_jd: timing.map(|_| 0.0),
            notes: Vec::new(),
        }
    }

    #[test]
    fn window_drops_oldest() {
        let mut h = ValidationHistory::new(2);
        h.push(result(false, Some(100.0)));
        h.push(result(true, Some(1.0)));
        h.push(result(true, Some(3.0)));
        assert_eq!(h.len(), 2);
        let m = generate_report(&h);
        assert_eq!((m.total, m.passed), (2, 2));
        assert_eq!(m.max_timing_error_s, Some(3.0));
        assert!((m.mean_timing_error_s.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_report() {
        let m = generate_report(&ValidationHistory::new(5));
        assert_eq!(m.total, 0);
        assert_eq!(m.pass_rate, 0.0);
        assert!(m.mean_timing_error_s.is_none());
    }

    #[test]
    fn missing_reference_counted() {
        let mut h = ValidationHistory::new(10);
        h.push(result(false, None));
        h.push(result(true, Some(0.5)));
        let m = generate_report(&h);
        assert_eq!(m.missing_reference, 1);
        assert!((m.pass_rate - 0.5).abs() < 1e-12);
        assert_eq!(m.mean_timing_error_s, Some(0.5));
    }
}
