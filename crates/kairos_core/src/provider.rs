//! The position provider contract.
//!
//! The provider is an external black box: a pure, synchronous function of
//! body and epoch, plus global/local eclipse primitives. Locators never look
//! inside it; they only sample it.

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::error::ProviderError;

/// Geocentric ecliptic state of a body at one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyPosition {
    /// Ecliptic longitude in degrees [0, 360).
    pub longitude_deg: f64,
    /// Ecliptic latitude in degrees.
    pub latitude_deg: f64,
    /// Distance from the observer (provider units, typically AU).
    pub distance: f64,
    /// Longitude speed in degrees per day. Negative means retrograde.
    pub angular_velocity: f64,
}

impl BodyPosition {
    pub fn is_retrograde(&self) -> bool {
        self.angular_velocity < 0.0
    }
}

/// Direction for provider searches that can run either way in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Eclipse family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EclipseKind {
    Solar,
    Lunar,
}

/// Eclipse classification at greatest eclipse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EclipseSubtype {
    Total,
    Annular,
    Hybrid,
    Partial,
    Penumbral,
}

impl EclipseSubtype {
    /// Whether this subtype can occur for the given eclipse kind.
    pub const fn applies_to(self, kind: EclipseKind) -> bool {
        match kind {
            EclipseKind::Solar => !matches!(self, Self::Penumbral),
            EclipseKind::Lunar => matches!(self, Self::Total | Self::Partial | Self::Penumbral),
        }
    }
}

/// Approximate greatest-eclipse data returned by the provider's global search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalEclipse {
    pub kind: EclipseKind,
    pub subtype: EclipseSubtype,
    /// Greatest eclipse as Julian Date (TDB).
    pub jd_max: f64,
    pub magnitude: f64,
    pub obscuration: Option<f64>,
    pub saros_series: Option<u32>,
}

/// Geographic location of an observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Geodetic latitude in degrees, north positive.
    pub latitude_deg: f64,
    /// Geodetic longitude in degrees, east positive.
    pub longitude_deg: f64,
    /// Altitude above the ellipsoid in metres.
    pub altitude_m: f64,
}

impl GeoLocation {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }

    /// Validate the coordinate ranges.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.latitude_deg.is_finite() || self.latitude_deg.abs() > 90.0 {
            return Err("latitude must be within [-90, 90]");
        }
        if !self.longitude_deg.is_finite() || self.longitude_deg.abs() > 180.0 {
            return Err("longitude must be within [-180, 180]");
        }
        if !self.altitude_m.is_finite() {
            return Err("altitude must be finite");
        }
        Ok(())
    }
}

/// Eclipse circumstances for one observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalCircumstances {
    /// Whether any phase is above the horizon at the location.
    pub visible: bool,
    /// Local maximum as Julian Date (TDB).
    pub jd_local_max: f64,
    /// Local magnitude at maximum.
    pub magnitude: f64,
    /// Local obscuration at maximum, when the provider reports it.
    pub obscuration: Option<f64>,
}

/// House system selector passed through to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseSystem {
    Placidus,
    Koch,
    Equal,
    WholeSign,
}

/// House cusps and angles as computed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseCusps {
    pub cusps_deg: [f64; 12],
    pub ascendant_deg: f64,
    pub midheaven_deg: f64,
}

/// The black-box position function every locator samples.
///
/// Implementations must be pure (same inputs → same outputs) and safe to
/// call from many threads at once.
pub trait PositionProvider: Send + Sync {
    /// Geocentric ecliptic position of `body` at `jd_tdb`.
    fn position(&self, body: Body, jd_tdb: f64) -> Result<BodyPosition, ProviderError>;

    /// Whether [`positions`](Self::positions) is natively batched.
    fn supports_vectorized(&self) -> bool {
        false
    }

    /// Positions of one body at many epochs, index-aligned with `jds`.
    ///
    /// Must return exactly what repeated [`position`](Self::position) calls
    /// would.
    fn positions(&self, body: Body, jds: &[f64]) -> Vec<Result<BodyPosition, ProviderError>> {
        jds.iter().map(|&jd| self.position(body, jd)).collect()
    }

    /// Approximate next (or previous) eclipse of `kind` from `jd_tdb`.
    fn global_eclipse_search(
        &self,
        _kind: EclipseKind,
        _jd_tdb: f64,
        _direction: SearchDirection,
    ) -> Result<Option<GlobalEclipse>, ProviderError> {
        Err(ProviderError::Unsupported("global_eclipse_search"))
    }

    /// Circumstances of the eclipse whose greatest phase is near `jd_tdb`
    /// as seen from `location`.
    fn local_eclipse_circumstances(
        &self,
        _kind: EclipseKind,
        _jd_tdb: f64,
        _location: &GeoLocation,
    ) -> Result<LocalCircumstances, ProviderError> {
        Err(ProviderError::Unsupported("local_eclipse_circumstances"))
    }

    /// House cusps for a location and system.
    fn houses(
        &self,
        _jd_tdb: f64,
        _location: &GeoLocation,
        _system: HouseSystem,
    ) -> Result<HouseCusps, ProviderError> {
        Err(ProviderError::Unsupported("houses"))
    }
}
