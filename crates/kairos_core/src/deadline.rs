//! Cooperative deadline checked by long-running scans.

use std::time::{Duration, Instant};

/// A point in wall-clock time after which a scan should stop and return
/// what it has found so far. `Deadline::none()` never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    pub const fn none() -> Self {
        Self { at: None }
    }

    /// Expire at a fixed instant.
    pub const fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }

    /// Expire `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
        }
    }

    pub fn instant(&self) -> Option<Instant> {
        self.at
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// The earlier of two deadlines.
    pub fn min(self, other: Deadline) -> Deadline {
        match (self.at, other.at) {
            (Some(a), Some(b)) => Deadline::at(a.min(b)),
            (Some(a), None) => Deadline::at(a),
            (None, b) => Deadline { at: b },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_never_expires() {
        assert!(!Deadline::none().is_expired());
    }

    #[test]
    fn zero_timeout_expires() {
        assert!(Deadline::after(Duration::ZERO).is_expired());
    }

    #[test]
    fn min_picks_earlier() {
        let now = Instant::now();
        let early = Deadline::at(now);
        let late = Deadline::at(now + Duration::from_secs(60));
        assert_eq!(early.min(late), early);
        assert_eq!(Deadline::none().min(late), late);
    }
}
