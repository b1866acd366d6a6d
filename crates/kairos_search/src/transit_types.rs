//! Types for transit (longitude crossing) search.

use kairos_core::Body;
use serde::{Deserialize, Serialize};

use crate::event_types::EventSearch;
use crate::scan::ScanConfig;

/// A body crossing a target ecliptic longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitEvent {
    pub body: Body,
    /// Target ecliptic longitude in degrees [0, 360).
    pub target_longitude_deg: f64,
    /// Crossing time as Julian Date (TDB).
    pub jd_tdb: f64,
    /// Whether the body was moving backward at the crossing.
    pub is_retrograde: bool,
    /// Longitude speed at the crossing in degrees per day.
    pub angular_velocity: f64,
    /// Days from entering the orb to the exact crossing.
    pub approach_duration_days: Option<f64>,
    /// Days from the exact crossing to leaving the orb.
    pub separation_duration_days: Option<f64>,
}

pub type TransitSearch = EventSearch<TransitEvent>;

/// Configuration for transit search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitConfig {
    /// Bisection stops once the bracket spans less than this many degrees.
    pub precision_deg: f64,
    /// Maximum bisection iterations per bracket.
    pub max_iterations: u32,
    /// Orb for approach/separation durations in degrees.
    pub orb_deg: f64,
    pub compute_orb_durations: bool,
    pub scan: ScanConfig,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            precision_deg: 1e-6,
            max_iterations: 100,
            orb_deg: 1.0,
            compute_orb_durations: true,
            scan: ScanConfig::default(),
        }
    }
}

impl TransitConfig {
    /// Exact crossings only, no orb durations.
    pub fn exact_only() -> Self {
        Self {
            compute_orb_durations: false,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !self.precision_deg.is_finite() || self.precision_deg <= 0.0 {
            return Err("precision_deg must be positive");
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0");
        }
        if !self.orb_deg.is_finite() || self.orb_deg <= 0.0 || self.orb_deg >= 30.0 {
            return Err("orb_deg must be within (0, 30)");
        }
        self.scan.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_valid() {
        assert!(TransitConfig::default().validate().is_ok());
        assert!(!TransitConfig::exact_only().compute_orb_durations);
    }

    #[test]
    fn rejects_zero_precision() {
        let c = TransitConfig {
            precision_deg: 0.0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_zero_chunk() {
        let mut c = TransitConfig::default();
        c.scan.vector_chunk = 0;
        assert!(c.validate().is_err());
    }
}
