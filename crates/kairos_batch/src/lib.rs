//! Bounded parallel execution of independent kairos requests.
//!
//! One [`BatchOptimizer`] owns one worker pool for the life of the engine.
//! [`BatchOptimizer::run_batch`] returns outcomes index-aligned with the
//! requests; a slot that fails, panics or times out never affects the
//! others.

pub mod error;
pub mod optimizer;

pub use error::{BatchError, SlotError};
pub use optimizer::{BatchConfig, BatchOptimizer, HARD_STOP_GRACE, SlotOutcome};
