//! Types for sign ingress search.

use kairos_core::{Body, normalize_deg};
use serde::{Deserialize, Serialize};

use crate::event_types::EventSearch;
use crate::transit_types::TransitConfig;

/// The twelve 30°-wide tropical zodiac signs, Aries at 0°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl Sign {
    pub const ALL: [Sign; 12] = [
        Sign::Aries,
        Sign::Taurus,
        Sign::Gemini,
        Sign::Cancer,
        Sign::Leo,
        Sign::Virgo,
        Sign::Libra,
        Sign::Scorpio,
        Sign::Sagittarius,
        Sign::Capricorn,
        Sign::Aquarius,
        Sign::Pisces,
    ];

    /// 0-based index (Aries = 0).
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Longitude of the sign's first degree.
    pub fn start_deg(self) -> f64 {
        f64::from(self.index()) * 30.0
    }

    /// Sign containing an ecliptic longitude.
    pub fn from_longitude(longitude_deg: f64) -> Self {
        let idx = (normalize_deg(longitude_deg) / 30.0).floor() as usize;
        Self::ALL[idx.min(11)]
    }
}

/// A body entering a sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngressEvent {
    pub body: Body,
    /// The sign being entered.
    pub sign: Sign,
    /// Boundary crossed, in degrees (a multiple of 30).
    pub boundary_deg: f64,
    /// Ingress time as Julian Date (TDB).
    pub jd_tdb: f64,
    /// Entered backward, through the sign's last degree.
    pub is_retrograde: bool,
}

pub type IngressSearch = EventSearch<IngressEvent>;

/// Ingress search shares the transit tolerances; orb settings are ignored.
pub type IngressConfig = TransitConfig;
