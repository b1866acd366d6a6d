//! Event engine facade for kairos.
//!
//! [`EventEngine`] ties the workspace together: it takes a
//! [`PositionProvider`] and one [`Settings`] value, and exposes the locator
//! calls (transits, ingresses, stations, eclipses) behind a multi-tier cache,
//! a bounded batch pool, and an optional accuracy validator.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kairos_rs::*;
//!
//! let engine = EventEngine::new(Arc::new(my_provider), Settings::default())?;
//! let mars = engine.find_next_transit(Body::Mars, 90.0, 2_460_000.5, 3)?;
//! for event in &mars.events {
//!     println!("{:.5} retrograde={}", event.jd_tdb, event.is_retrograde);
//! }
//! ```

mod components;
pub mod engine;
pub mod error;
pub mod logging;
pub mod request;

pub use engine::EventEngine;
pub use error::EngineError;
pub use logging::init_tracing;
pub use request::{BatchRequest, BatchResponse};

// Re-export the types callers need so `use kairos_rs::*` is enough.
pub use kairos_batch::{SlotError, SlotOutcome};
pub use kairos_cache::{CacheScope, CacheStats, Clock, ManualClock, SystemClock};
pub use kairos_config::Settings;
pub use kairos_core::{
    Body, BodyPosition, Deadline, EclipseKind, EclipseSubtype, GeoLocation, GlobalEclipse,
    LocalCircumstances, PositionProvider, ProviderError, SearchDirection,
};
pub use kairos_search::{
    EclipseEvent, EclipseSearch, EventSearch, IngressEvent, IngressSearch, SearchError,
    SearchNote, Sign, StationEvent, StationSearch, StationType, TransitEvent, TransitSearch,
    Truncation,
};
pub use kairos_validate::{
    AccuracyMetrics, CheckKind, ObservedEvent, ReferenceCatalogue, ReferenceRecord,
    ValidationResult,
};
