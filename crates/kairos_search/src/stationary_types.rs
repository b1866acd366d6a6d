//! Types for station search.

use kairos_core::Body;
use serde::{Deserialize, Serialize};

use crate::event_types::EventSearch;
use crate::scan::ScanConfig;

/// Station type: retrograde or direct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationType {
    /// Longitude speed crosses from positive to negative.
    StationRetrograde,
    /// Longitude speed crosses from negative to positive.
    StationDirect,
}

/// The instant a body's longitude speed passes through zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationEvent {
    pub body: Body,
    /// Event time as Julian Date (TDB).
    pub jd_tdb: f64,
    /// Ecliptic longitude at station in degrees [0, 360).
    pub longitude_deg: f64,
    pub station_type: StationType,
}

pub type StationSearch = EventSearch<StationEvent>;

/// Configuration for station search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Bisection stops once the speed bracket spans less than this (deg/day).
    pub precision: f64,
    pub max_iterations: u32,
    pub scan: ScanConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            precision: 1e-7,
            max_iterations: 100,
            scan: ScanConfig::default(),
        }
    }
}

impl StationConfig {
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !self.precision.is_finite() || self.precision <= 0.0 {
            return Err("precision must be positive");
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0");
        }
        self.scan.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_valid() {
        assert!(StationConfig::default().validate().is_ok());
    }

    #[test]
    fn station_type_serializes_snake_case() {
        let json = serde_json::to_string(&StationType::StationDirect).unwrap();
        assert_eq!(json, "\"station_direct\"");
    }
}
