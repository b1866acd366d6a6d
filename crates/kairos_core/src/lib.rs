//! Core contract between the kairos search engine and an ephemeris provider.
//!
//! This crate provides:
//! - [`Body`] and its per-body scan characteristics
//! - [`BodyPosition`] and the [`PositionProvider`] trait (the black-box
//!   position function every locator queries)
//! - Global/local eclipse primitives consumed from the provider
//! - Wraparound-aware angle helpers ([`shortest_diff`] and friends)
//! - The Julian-day constant and a cooperative [`Deadline`]

pub mod angle;
pub mod body;
pub mod deadline;
pub mod error;
pub mod julian;
pub mod provider;

pub use angle::{angular_separation_deg, is_genuine_crossing, normalize_deg, shortest_diff};
pub use body::Body;
pub use deadline::Deadline;
pub use error::ProviderError;
pub use julian::SECONDS_PER_DAY;
pub use provider::{
    BodyPosition, EclipseKind, EclipseSubtype, GeoLocation, GlobalEclipse, HouseCusps,
    HouseSystem, LocalCircumstances, PositionProvider, SearchDirection,
};
