//! Comparing computed events with reference records.
//!
//! Algorithm:
//! 1. Reduce the event to an [`ObservedEvent`] (kind, body, time and the
//!    optional longitude/magnitude it carries).
//! 2. Find the matching reference record closest in time, within
//!    `window_days`. No record means an explicit "no reference" failure.
//! 3. Timing error is `|jd - jd_ref|` in seconds; position error is the
//!    shortest angular distance; magnitude error is the absolute difference.
//! 4. The event passes when every error that could be computed is within its
//!    tolerance. Tolerances are inclusive.

use kairos_core::{Body, SECONDS_PER_DAY, shortest_diff};
use kairos_search::{EclipseEvent, IngressEvent, StationEvent, TransitEvent};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reference::{CheckKind, ReferenceCatalogue};

/// Float slack on the inclusive timing comparison (seconds).
const TIMING_SLACK_S: f64 = 1e-3;

/// The parts of a computed event that validation compares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedEvent {
    pub kind: CheckKind,
    pub body: Option<Body>,
    pub jd_tdb: f64,
    pub longitude_deg: Option<f64>,
    pub magnitude: Option<f64>,
}

impl From<&TransitEvent> for ObservedEvent {
    fn from(e: &TransitEvent) -> Self {
        Self {
            kind: CheckKind::Transit,
            body: Some(e.body),
            jd_tdb: e.jd_tdb,
            longitude_deg: Some(e.target_longitude_deg),
            magnitude: None,
        }
    }
}

impl From<&IngressEvent> for ObservedEvent {
    fn from(e: &IngressEvent) -> Self {
        Self {
            kind: CheckKind::Ingress,
            body: Some(e.body),
            jd_tdb: e.jd_tdb,
            longitude_deg: Some(e.boundary_deg),
            magnitude: None,
        }
    }
}

impl From<&StationEvent> for ObservedEvent {
    fn from(e: &StationEvent) -> Self {
        Self {
            kind: CheckKind::Station,
            body: Some(e.body),
            jd_tdb: e.jd_tdb,
            longitude_deg: Some(e.longitude_deg),
            magnitude: None,
        }
    }
}

impl From<&EclipseEvent> for ObservedEvent {
    fn from(e: &EclipseEvent) -> Self {
        Self {
            kind: CheckKind::Eclipse,
            body: None,
            jd_tdb: e.jd_max,
            longitude_deg: None,
            magnitude: Some(e.magnitude),
        }
    }
}

/// Tolerances and lookup window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Records further than this from the event are not considered.
    pub window_days: f64,
    pub transit_tolerance_s: f64,
    pub ingress_tolerance_s: f64,
    pub station_tolerance_s: f64,
    pub eclipse_tolerance_s: f64,
    pub position_tolerance_deg: f64,
    pub magnitude_tolerance: f64,
    /// Results kept by a [`ValidationHistory`].
    pub history_window: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            window_days: 365.25,
            transit_tolerance_s: 60.0,
            ingress_tolerance_s: 60.0,
            station_tolerance_s: 3_600.0,
            eclipse_tolerance_s: 120.0,
            position_tolerance_deg: 0.01,
            magnitude_tolerance: 0.01,
            history_window: 100,
        }
    }
}

impl ValidatorConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.window_days.is_finite() || self.window_days <= 0.0 {
            return Err("window_days must be positive");
        }
        let tolerances = [
            self.transit_tolerance_s,
            self.ingress_tolerance_s,
            self.station_tolerance_s,
            self.eclipse_tolerance_s,
            self.position_tolerance_deg,
            self.magnitude_tolerance,
        ];
        if tolerances.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err("tolerances must be finite and >= 0");
        }
        if self.history_window == 0 {
            return Err("history_window must be > 0");
        }
        Ok(())
    }

    pub fn timing_tolerance_s(&self, kind: CheckKind) -> f64 {
        match kind {
            CheckKind::Transit => self.transit_tolerance_s,
            CheckKind::Ingress => self.ingress_tolerance_s,
            CheckKind::Station => self.station_tolerance_s,
            CheckKind::Eclipse => self.eclipse_tolerance_s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub kind: CheckKind,
    pub is_valid: bool,
    /// `None` when no reference record was found.
    pub timing_error_s: Option<f64>,
    /// Angular distance between computed and reference longitude.
    pub position_error_deg: Option<f64>,
    pub magnitude_error: Option<f64>,
    pub reference_source: Option<String>,
    pub reference_jd: Option<f64>,
    pub notes: Vec<String>,
}

impl ValidationResult {
    pub fn has_reference(&self) -> bool {
        self.reference_jd.is_some()
    }
}

/// Validate one event against the catalogue.
pub fn validate(
    event: &ObservedEvent,
    catalogue: &ReferenceCatalogue,
    config: &ValidatorConfig,
) -> ValidationResult {
    let Some(record) = catalogue.closest(event.kind, event.body, event.jd_tdb, config.window_days)
    else {
        debug!(kind = ?event.kind, jd = event.jd_tdb, "no reference record in window");
        return ValidationResult {
            kind: event.kind,
            is_valid: false,
            timing_error_s: None,
            position_error_deg: None,
            magnitude_error: None,
            reference_source: None,
            reference_jd: None,
            notes: vec![format!(
                "no {:?} reference within {} days",
                event.kind, config.window_days
            )],
        };
    };

    let mut notes = Vec::new();
    let timing_error_s = (event.jd_tdb - record.jd_tdb).abs() * SECONDS_PER_DAY;
    let timing_tolerance = config.timing_tolerance_s(event.kind);
    let mut is_valid = timing_error_s <= timing_tolerance + TIMING_SLACK_S;
    if !is_valid {
        notes.push(format!(
            "timing error {timing_error_s:.3} s exceeds {timing_tolerance} s"
        ));
    }

    let position_error_deg = match (event.longitude_deg, record.longitude_deg) {
        (Some(a), Some(b)) => Some(shortest_diff(b, a).abs()),
        _ => None,
    };
    if let Some(err) = position_error_deg
        && err > config.position_tolerance_deg
    {
        is_valid = false;
        notes.push(format!(
            "position error {err:.6} deg exceeds {} deg",
            config.position_tolerance_deg
        ));
    }

    let magnitude_error = match (event.magnitude, record.magnitude) {
        (Some(a), Some(b)) => Some((a - b).abs()),
        _ => None,
    };
    if let Some(err) = magnitude_error
        && err > config.magnitude_tolerance
    {
        is_valid = false;
        notes.push(format!(
            "magnitude error {err:.4} exceeds {}",
            config.magnitude_tolerance
        ));
    }

    ValidationResult {
        kind: event.kind,
        is_valid,
        timing_error_s: Some(timing_error_s),
        position_error_deg,
        magnitude_error,
        reference_source: Some(record.source.clone()),
        reference_jd: Some(record.jd_tdb),
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceRecord;

    fn catalogue() -> ReferenceCatalogue {
        ReferenceCatalogue::new(
            "t",
            vec![
                ReferenceRecord {
                    kind: CheckKind::Transit,
                    body: Some(Body::Mars),
                    jd_tdb: 2_460_000.0,
                    longitude_deg: Some(359.995),
                    magnitude: None,
                    source: "ref-a".into(),
                },
                ReferenceRecord {
                    kind: CheckKind::Eclipse,
                    body: None,
                    jd_tdb: 2_460_100.0,
                    longitude_deg: None,
                    magnitude: Some(1.05),
                    source: "ref-b".into(),
                },
            ],
        )
        .unwrap()
    }

    fn transit(jd: f64, lon: f64) -> ObservedEvent {
        ObservedEvent {
            kind: CheckKind::Transit,
            body: Some(Body::Mars),
            jd_tdb: jd,
            longitude_deg: Some(lon),
            magnitude: None,
        }
    }

    #[test]
    fn position_error_wraps() {
        let r = validate(
            &transit(2_460_000.0, 0.004),
            &catalogue(),
            &ValidatorConfig::default(),
        );
        assert!(r.is_valid, "{r:?}");
        assert!((r.position_error_deg.unwrap() - 0.009).abs() < 1e-9);
        assert_eq!(r.reference_source.as_deref(), Some("ref-a"));
    }

    #[test]
    fn no_reference_is_explicit_failure() {
        let r = validate(
            &transit(2_470_000.0, 0.0),
            &catalogue(),
            &ValidatorConfig::default(),
        );
        assert!(!r.is_valid);
        assert!(!r.has_reference());
        assert!(r.timing_error_s.is_none());
        assert_eq!(r.notes.len(), 1);
    }

    #[test]
    fn magnitude_checked_for_eclipses() {
        let event = ObservedEvent {
            kind: CheckKind::Eclipse,
            body: None,
            jd_tdb: 2_460_100.0,
            longitude_deg: None,
            magnitude: Some(1.10),
        };
        let r = validate(&event, &catalogue(), &ValidatorConfig::default());
        assert!(!r.is_valid);
        assert!((r.magnitude_error.unwrap() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn config_rejects_negative_tolerance() {
        let c = ValidatorConfig {
            ingress_tolerance_s: -1.0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }
}
