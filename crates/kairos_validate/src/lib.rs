//! Accuracy validation for computed kairos events.
//!
//! Computed events are compared with the closest matching record of a
//! versioned [`ReferenceCatalogue`]. Each check yields a
//! [`ValidationResult`]; a [`Validator`] keeps a rolling
//! [`ValidationHistory`] and summarizes it as [`AccuracyMetrics`].

pub mod error;
pub mod history;
pub mod reference;
pub mod validator;

pub use error::ValidateError;
pub use history::{AccuracyMetrics, ValidationHistory, Validator, generate_report};
pub use reference::{CheckKind, ReferenceCatalogue, ReferenceRecord};
pub use validator::{ObservedEvent, ValidationResult, ValidatorConfig, validate};
