//! Julian Date time-scale constants.

/// Seconds in one Julian day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;
