//! Root-finding search core shared by every locator.
//!
//! Pure bisection on a scalar function of time. The function is typically a
//! wrapped angular difference in [-180, 180), so bracket validity uses the
//! same seam test as the coarse scans: a sign change across the ±180° jump
//! is not a root.
//!
//! The window is presumed to hold at most one crossing (callers coarse-scan
//! first). The core never guesses: a bracket without a genuine sign change,
//! or one that cannot be narrowed below `precision`, comes back with
//! `found() == false`.

use std::time::{Duration, Instant};

use kairos_core::{ProviderError, is_genuine_crossing};
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Narrowest bracket the core will bisect, in days (~86 µs). Below this the
/// midpoint stops being distinguishable from the endpoints at modern JDs.
pub const MIN_WINDOW_DAYS: f64 = 1e-9;

/// A closed time window `[lower, upper]` in JD (TDB).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchWindow {
    lower: f64,
    upper: f64,
}

impl SearchWindow {
    /// Build a window, rejecting non-finite or reversed bounds.
    pub fn new(lower: f64, upper: f64) -> Result<Self, SearchError> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(SearchError::InvalidConfig("window bounds must be finite"));
        }
        if lower > upper {
            return Err(SearchError::InvalidRange {
                start_jd: lower,
                end_jd: upper,
            });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, jd: f64) -> bool {
        jd >= self.lower && jd <= self.upper
    }
}

/// Outcome of one bracketed search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Root instant as JD (TDB); present iff the search converged.
    pub jd_tdb: Option<f64>,
    /// Final bracket span in function units (0 for an exact hit).
    pub achieved_precision: f64,
    /// Midpoint evaluations performed.
    pub iterations: u32,
    pub elapsed: Duration,
}

impl SearchResult {
    pub fn found(&self) -> bool {
        self.jd_tdb.is_some()
    }

    fn hit(jd: f64, precision: f64, iterations: u32, started: Instant) -> Self {
        Self {
            jd_tdb: Some(jd),
            achieved_precision: precision,
            iterations,
            elapsed: started.elapsed(),
        }
    }

    fn miss(precision: f64, iterations: u32, started: Instant) -> Self {
        Self {
            jd_tdb: None,
            achieved_precision: precision,
            iterations,
            elapsed: started.elapsed(),
        }
    }
}

/// Bisect `f` over `window` until the bracket's span in `f` is below
/// `precision` or `max_iterations` midpoints have been evaluated.
///
/// On success the reported instant is the bracket endpoint with the smaller
/// `|f|`, so `|f(jd)| < precision` holds for the returned instant.
pub fn search<F>(
    window: SearchWindow,
    mut f: F,
    precision: f64,
    max_iterations: u32,
) -> Result<SearchResult, SearchError>
where
    F: FnMut(f64) -> Result<f64, ProviderError>,
{
    if !precision.is_finite() || precision <= 0.0 {
        return Err(SearchError::InvalidConfig("precision must be positive"));
    }
    if max_iterations == 0 {
        return Err(SearchError::InvalidConfig("max_iterations must be > 0"));
    }

    let started = Instant::now();
    let (mut lo, mut hi) = (window.lower, window.upper);
    let mut f_lo = f(lo)?;
    if f_lo == 0.0 {
        return Ok(SearchResult::hit(lo, 0.0, 0, started));
    }
    let mut f_hi = f(hi)?;
    if f_hi == 0.0 {
        return Ok(SearchResult::hit(hi, 0.0, 0, started));
    }
    if !is_genuine_crossing(f_lo, f_hi) {
        return Ok(SearchResult::miss((f_hi - f_lo).abs(), 0, started));
    }

    let mut span = (f_hi - f_lo).abs();
    let mut iterations = 0;
    while span >= precision && iterations < max_iterations {
        if hi - lo <= MIN_WINDOW_DAYS {
            // Discontinuity or flat spot: the bracket cannot narrow further.
            break;
        }
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid)?;
        iterations += 1;

        if f_mid == 0.0 {
            return Ok(SearchResult::hit(mid, 0.0, iterations, started));
        }
        if f_lo * f_mid < 0.0 {
            hi = mid;
            f_hi = f_mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
        span = (f_hi - f_lo).abs();
    }

    if span < precision {
        let jd = if f_lo.abs() <= f_hi.abs() { lo } else { hi };
        Ok(SearchResult::hit(jd, span, iterations, started))
    } else {
        Ok(SearchResult::miss(span, iterations, started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(v: f64) -> Result<f64, ProviderError> {
        Ok(v)
    }

    #[test]
    fn window_rejects_reversed() {
        assert!(matches!(
            SearchWindow::new(2.0, 1.0),
            Err(SearchError::InvalidRange { .. })
        ));
        assert!(SearchWindow::new(1.0, 1.0).is_ok());
        assert!(SearchWindow::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn linear_root_found() {
        let w = SearchWindow::new(0.0, 10.0).unwrap();
        let r = search(w, |t| ok(t - 3.3), 1e-7, 100).unwrap();
        let jd = r.jd_tdb.expect("root should be found");
        assert!((jd - 3.3).abs() < 1e-7);
        assert!(r.achieved_precision < 1e-7);
        assert!(r.iterations > 0);
    }

    #[test]
    fn decreasing_function() {
        let w = SearchWindow::new(0.0, 4.0).unwrap();
        let r = search(w, |t| ok(2.0 - t * t / 2.0), 1e-8, 200).unwrap();
        assert!((r.jd_tdb.unwrap() - 2.0).abs() < 1e-7);
    }

    #[test]
    fn same_sign_bracket_not_found() {
        let w = SearchWindow::new(0.0, 1.0).unwrap();
        let r = search(w, |t| ok(t + 5.0), 1e-6, 100).unwrap();
        assert!(!r.found());
        assert_eq!(r.iterations, 0);
    }

    #[test]
    fn seam_jump_is_not_a_root() {
        // Wrapped difference jumping from +179 to -179 is the seam, not a crossing.
        let w = SearchWindow::new(0.0, 1.0).unwrap();
        let r = search(w, |t| ok(if t < 0.5 { 179.0 } else { -179.0 }), 1e-6, 100).unwrap();
        assert!(!r.found());
    }

    #[test]
    fn step_discontinuity_exhausts() {
        let w = SearchWindow::new(0.0, 1.0).unwrap();
        let r = search(w, |t| ok(if t < 0.3 { -1.0 } else { 1.0 }), 1e-6, 500).unwrap();
        assert!(!r.found());
        assert!((r.achieved_precision - 2.0).abs() < 1e-12);
    }

    #[test]
    fn iteration_cap_reports_not_found() {
        let w = SearchWindow::new(0.0, 10.0).unwrap();
        let r = search(w, |t| ok(t - 3.3), 1e-12, 3).unwrap();
        assert!(!r.found());
        assert_eq!(r.iterations, 3);
    }

    #[test]
    fn exact_endpoint_hit() {
        let w = SearchWindow::new(2.0, 5.0).unwrap();
        let r = search(w, |t| ok(t - 2.0), 1e-6, 10).unwrap();
        assert_eq!(r.jd_tdb, Some(2.0));
        assert_eq!(r.iterations, 0);
    }

    #[test]
    fn rejects_bad_precision() {
        let w = SearchWindow::new(0.0, 1.0).unwrap();
        assert!(search(w, ok, 0.0, 10).is_err());
        assert!(search(w, ok, 1e-6, 0).is_err());
    }

    #[test]
    fn provider_error_propagates() {
        let w = SearchWindow::new(0.0, 1.0).unwrap();
        let r = search(w, |_| Err(ProviderError::Fault("boom".into())), 1e-6, 10);
        assert!(matches!(r, Err(SearchError::Provider(_))));
    }

    #[test]
    fn flat_region_terminates() {
        // Near-zero slope around the root: must stop, not narrow forever.
        let w = SearchWindow::new(-1.0, 2.0).unwrap();
        let r = search(w, |t| ok(t.powi(9)), 1e-300, 10_000).unwrap();
        assert!(r.iterations < 10_000);
    }
}
