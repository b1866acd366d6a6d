//! Celestial threshold-crossing search: transits, sign ingresses, stations
//! and eclipses over a black-box [`PositionProvider`](kairos_core::PositionProvider).
//!
//! This crate provides:
//! - A generic bisection [`search`] core over a scalar function of time
//! - Transit search (body reaching a target longitude, retrograde-aware)
//! - Sign ingress search (the twelve 30° boundaries)
//! - Station search (longitude speed through zero)
//! - Eclipse search driven by the provider's global/local primitives
//!
//! Every locator returns an [`EventSearch`]: events found so far, notes on
//! skipped samples, and a [`Truncation`] when the range was not covered.

pub mod eclipse;
pub mod eclipse_types;
pub mod error;
pub mod event_types;
pub mod ingress;
pub mod ingress_types;
pub(crate) mod scan;
pub mod search_core;
pub mod stationary;
pub mod stationary_types;
pub mod transit;
pub mod transit_types;

pub use eclipse::{find_next_eclipse, find_previous_eclipse, search_eclipses_in_range};
pub use eclipse_types::{EclipseConfig, EclipseEvent, EclipseFilter, EclipseSearch};
pub use error::SearchError;
pub use event_types::{EventSearch, SearchNote, Truncation};
pub use ingress::{find_sign_ingress, search_sign_ingresses};
pub use ingress_types::{IngressConfig, IngressEvent, IngressSearch, Sign};
pub use scan::ScanConfig;
pub use search_core::{MIN_WINDOW_DAYS, SearchResult, SearchWindow, search};
pub use stationary::{next_station, search_stations};
pub use stationary_types::{StationConfig, StationEvent, StationSearch, StationType};
pub use transit::{find_next_transit, search_transits};
pub use transit_types::{TransitConfig, TransitEvent, TransitSearch};
