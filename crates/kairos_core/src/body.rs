//! Bodies the engine can search for, with their scan characteristics.

use serde::{Deserialize, Serialize};

/// Bodies supported by the search contract.
///
/// Codes follow NAIF conventions so providers backed by SPK kernels can map
/// them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

/// Arc (degrees) a body should cover between two coarse-scan samples.
const SCAN_ARC_DEG: f64 = 1.0;

/// Finest coarse-scan step in days.
const MIN_SCAN_STEP_DAYS: f64 = 0.05;

/// Coarsest coarse-scan step in days. Slow bodies station for weeks, so a
/// larger step would risk stepping over a whole retrograde loop.
const MAX_SCAN_STEP_DAYS: f64 = 2.0;

impl Body {
    pub const ALL: [Body; 11] = [
        Self::Sun,
        Self::Moon,
        Self::Mercury,
        Self::Venus,
        Self::Earth,
        Self::Mars,
        Self::Jupiter,
        Self::Saturn,
        Self::Uranus,
        Self::Neptune,
        Self::Pluto,
    ];

    /// NAIF-style body code.
    pub const fn code(self) -> i32 {
        match self {
            Self::Sun => 10,
            Self::Moon => 301,
            Self::Mercury => 199,
            Self::Venus => 299,
            Self::Earth => 399,
            Self::Mars => 499,
            Self::Jupiter => 599,
            Self::Saturn => 699,
            Self::Uranus => 799,
            Self::Neptune => 899,
            Self::Pluto => 999,
        }
    }

    /// Convert a NAIF-style body code into a [`Body`].
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            10 => Some(Self::Sun),
            301 => Some(Self::Moon),
            199 => Some(Self::Mercury),
            299 => Some(Self::Venus),
            399 => Some(Self::Earth),
            499 => Some(Self::Mars),
            599 => Some(Self::Jupiter),
            699 => Some(Self::Saturn),
            799 => Some(Self::Uranus),
            899 => Some(Self::Neptune),
            999 => Some(Self::Pluto),
            _ => None,
        }
    }

    /// Typical geocentric longitude speed in degrees per day.
    pub const fn typical_speed_deg_per_day(self) -> f64 {
        match self {
            Self::Moon => 13.176,
            Self::Mercury => 1.383,
            Self::Venus => 1.2,
            Self::Sun | Self::Earth => 0.9856,
            Self::Mars => 0.524,
            Self::Jupiter => 0.083,
            Self::Saturn => 0.033,
            Self::Uranus => 0.012,
            Self::Neptune => 0.006,
            Self::Pluto => 0.004,
        }
    }

    /// Coarse-scan step in days: finer for faster bodies.
    pub fn scan_step_days(self) -> f64 {
        (SCAN_ARC_DEG / self.typical_speed_deg_per_day())
            .clamp(MIN_SCAN_STEP_DAYS, MAX_SCAN_STEP_DAYS)
    }

    /// Days after which a body has certainly revisited every longitude,
    /// retrograde loops included. Bounds open-ended forward scans.
    pub const fn scan_horizon_days(self) -> f64 {
        match self {
            Self::Moon => 30.0,
            Self::Sun | Self::Earth | Self::Mercury | Self::Venus => 400.0,
            Self::Mars => 800.0,
            Self::Jupiter => 4_400.0,
            Self::Saturn => 10_800.0,
            Self::Uranus => 30_700.0,
            Self::Neptune => 60_300.0,
            Self::Pluto => 90_600.0,
        }
    }

    /// Whether the body can station (longitude speed crossing zero) as seen
    /// from Earth. The Sun and Moon always move eastward; Earth is the observer.
    pub const fn can_station(self) -> bool {
        !matches!(self, Self::Sun | Self::Moon | Self::Earth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip_all() {
        for body in Body::ALL {
            assert_eq!(Body::from_code(body.code()), Some(body));
        }
        assert_eq!(Body::from_code(42), None);
    }

    #[test]
    fn faster_bodies_scan_finer() {
        assert!(Body::Moon.scan_step_days() < Body::Sun.scan_step_days());
        assert!(Body::Sun.scan_step_days() < Body::Mars.scan_step_days());
        assert!((Body::Pluto.scan_step_days() - MAX_SCAN_STEP_DAYS).abs() < 1e-12);
    }

    #[test]
    fn station_bodies() {
        assert!(!Body::Sun.can_station());
        assert!(!Body::Moon.can_station());
        assert!(!Body::Earth.can_station());
        assert!(Body::Mercury.can_station());
        assert!(Body::Pluto.can_station());
    }
}
