//! Types for eclipse search.

use kairos_core::{
    EclipseKind, EclipseSubtype, GeoLocation, GlobalEclipse, LocalCircumstances,
};
use serde::{Deserialize, Serialize};

use crate::event_types::EventSearch;

const DAYS_PER_YEAR: f64 = 365.25;

/// An eclipse at greatest phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipseEvent {
    pub kind: EclipseKind,
    pub subtype: EclipseSubtype,
    /// Greatest eclipse as Julian Date (TDB).
    pub jd_max: f64,
    pub magnitude: f64,
    pub obscuration: Option<f64>,
    /// Opaque eclipse-family identifier, passed through from the provider.
    pub saros_series: Option<u32>,
    /// Circumstances at the requested location, if one was given.
    pub local: Option<LocalCircumstances>,
    /// Whether `jd_max` was refined beyond the provider's estimate.
    pub refined: bool,
}

impl EclipseEvent {
    pub(crate) fn from_global(g: &GlobalEclipse) -> Self {
        Self {
            kind: g.kind,
            subtype: g.subtype,
            jd_max: g.jd_max,
            magnitude: g.magnitude,
            obscuration: g.obscuration,
            saros_series: g.saros_series,
            local: None,
            refined: false,
        }
    }
}

pub type EclipseSearch = EventSearch<EclipseEvent>;

/// Optional filters for single-eclipse search.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EclipseFilter {
    /// Only accept this subtype.
    pub subtype: Option<EclipseSubtype>,
    /// Only accept eclipses visible from this location.
    pub location: Option<GeoLocation>,
}

impl EclipseFilter {
    pub fn subtype(subtype: EclipseSubtype) -> Self {
        Self {
            subtype: Some(subtype),
            location: None,
        }
    }

    pub fn visible_from(location: GeoLocation) -> Self {
        Self {
            subtype: None,
            location: Some(location),
        }
    }

    pub(crate) fn validate(&self, kind: EclipseKind) -> Result<(), &'static str> {
        if let Some(st) = self.subtype
            && !st.applies_to(kind)
        {
            return Err("subtype filter does not apply to this eclipse kind");
        }
        if let Some(loc) = &self.location {
            loc.validate()?;
        }
        Ok(())
    }
}

/// Configuration for eclipse search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipseConfig {
    /// Longest accepted range for range search, in days.
    pub max_range_days: f64,
    /// How far single-eclipse search looks before giving up, in days.
    pub scan_horizon_days: f64,
    /// Refine the provider's greatest-eclipse estimate with bisection.
    pub refine: bool,
    /// Half-width of the refinement bracket, in days.
    pub refine_window_days: f64,
    /// Refinement stops once the separation-rate bracket spans less than
    /// this (deg/day).
    pub refine_precision: f64,
    pub max_iterations: u32,
}

impl Default for EclipseConfig {
    fn default() -> Self {
        Self {
            max_range_days: 10.0 * DAYS_PER_YEAR,
            scan_horizon_days: 25.0 * DAYS_PER_YEAR,
            refine: false,
            refine_window_days: 0.25,
            refine_precision: 1e-4,
            max_iterations: 100,
        }
    }
}

impl EclipseConfig {
    /// Default limits with refinement switched on.
    pub fn refined() -> Self {
        Self {
            refine: true,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !self.max_range_days.is_finite() || self.max_range_days <= 0.0 {
            return Err("max_range_days must be positive");
        }
        if !self.scan_horizon_days.is_finite() || self.scan_horizon_days <= 0.0 {
            return Err("scan_horizon_days must be positive");
        }
        if !self.refine_window_days.is_finite()
            || self.refine_window_days <= 0.0
            || self.refine_window_days > 5.0
        {
            return Err("refine_window_days must be within (0, 5]");
        }
        if !self.refine_precision.is_finite() || self.refine_precision <= 0.0 {
            return Err("refine_precision must be positive");
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_valid() {
        let c = EclipseConfig::default();
        assert!(c.validate().is_ok());
        assert!((c.max_range_days - 3652.5).abs() < 1e-9);
        assert!(EclipseConfig::refined().refine);
    }

    #[test]
    fn filter_rejects_mismatched_subtype() {
        let f = EclipseFilter::subtype(EclipseSubtype::Annular);
        assert!(f.validate(EclipseKind::Solar).is_ok());
        assert!(f.validate(EclipseKind::Lunar).is_err());
    }

    #[test]
    fn filter_rejects_bad_location() {
        let f = EclipseFilter::visible_from(GeoLocation::new(95.0, 0.0, 0.0));
        assert!(f.validate(EclipseKind::Solar).is_err());
    }
}
