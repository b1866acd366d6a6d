//! Transit search engine: when does a body reach a target longitude?
//!
//! Algorithm: coarse forward scan with a step keyed to the body's typical
//! speed, then bisection on f(t) = shortest_diff(target, lon(t)). The wrapped
//! difference lives in [-180, 180), so a sign change is a genuine crossing
//! only when both samples are small (see `is_genuine_crossing`). Retrograde
//! loops produce up to three crossings per cycle; the scan simply continues
//! past each one, so they come out chronologically.
//!
//! Approach and separation durations come from two extra searches on
//! g(t) = |shortest_diff(target, lon(t))| - orb, stepping outward from the
//! exact crossing until the body leaves the orb.

use kairos_core::{
    Body, Deadline, PositionProvider, ProviderError, SearchDirection, is_genuine_crossing,
    normalize_deg, shortest_diff,
};
use tracing::debug;

use crate::error::SearchError;
use crate::event_types::SearchNote;
use crate::scan::{Flow, Sample, finish, scan_pairs, validate_range};
use crate::search_core::{SearchWindow, search};
use crate::transit_types::{TransitConfig, TransitEvent, TransitSearch};

/// An open-ended search never scans more than this many body cycles.
const MAX_HORIZON_CYCLES: usize = 4;

/// Wrapped distance past the target, in [-180, 180).
fn offset_from_target(
    provider: &dyn PositionProvider,
    body: Body,
    target_deg: f64,
    jd: f64,
) -> Result<f64, ProviderError> {
    provider
        .position(body, jd)
        .map(|p| shortest_diff(target_deg, p.longitude_deg))
}

/// Refine a bracketed crossing. `None` when the bracket is bogus or bisection
/// did not converge; the reason is recorded in `notes`.
pub(crate) fn refine_crossing<F>(
    a: &Sample,
    b: &Sample,
    f: F,
    precision: f64,
    max_iterations: u32,
    notes: &mut Vec<SearchNote>,
) -> Option<f64>
where
    F: FnMut(f64) -> Result<f64, ProviderError>,
{
    let window = SearchWindow::new(a.jd, b.jd).ok()?;
    match search(window, f, precision, max_iterations) {
        Ok(r) => match r.jd_tdb {
            Some(jd) => Some(jd),
            None => {
                notes.push(SearchNote::SearchExhausted {
                    lower_jd: a.jd,
                    upper_jd: b.jd,
                    achieved_precision: r.achieved_precision,
                });
                None
            }
        },
        Err(SearchError::Provider(e)) => {
            notes.push(SearchNote::ProviderFault {
                jd_tdb: 0.5 * (a.jd + b.jd),
                message: e.to_string(),
            });
            None
        }
        Err(_) => None,
    }
}

/// Find where the body leaves the orb, stepping outward from `jd_exact`.
/// Gives up (`None`) once `deadline` passes.
fn orb_edge(
    provider: &dyn PositionProvider,
    body: Body,
    target_deg: f64,
    jd_exact: f64,
    direction: SearchDirection,
    config: &TransitConfig,
    deadline: &Deadline,
) -> Option<f64> {
    let g = |jd: f64| {
        offset_from_target(provider, body, target_deg, jd).map(|d| d.abs() - config.orb_deg)
    };
    let step = match direction {
        SearchDirection::Forward => body.scan_step_days(),
        SearchDirection::Backward => -body.scan_step_days(),
    };
    let max_steps = (body.scan_horizon_days() / body.scan_step_days()).ceil() as u64;

    let mut t_inside = jd_exact;
    for k in 1..=max_steps {
        if deadline.is_expired() {
            return None;
        }
        let t = jd_exact + k as f64 * step;
        let g_t = g(t).ok()?;
        if g_t >= 0.0 {
            let (lo, hi) = if t < t_inside { (t, t_inside) } else { (t_inside, t) };
            let window = SearchWindow::new(lo, hi).ok()?;
            let r = search(window, g, config.precision_deg, config.max_iterations).ok()?;
            return r.jd_tdb;
        }
        t_inside = t;
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn build_event(
    provider: &dyn PositionProvider,
    body: Body,
    target_deg: f64,
    jd: f64,
    a: &Sample,
    b: &Sample,
    config: &TransitConfig,
    deadline: &Deadline,
    notes: &mut Vec<SearchNote>,
) -> TransitEvent {
    let angular_velocity = match provider.position(body, jd) {
        Ok(p) => p.angular_velocity,
        Err(e) => {
            notes.push(SearchNote::ProviderFault {
                jd_tdb: jd,
                message: e.to_string(),
            });
            // Secant speed over the bracket.
            shortest_diff(a.pos.longitude_deg, b.pos.longitude_deg) / (b.jd - a.jd)
        }
    };

    let (approach, separation) = if config.compute_orb_durations {
        let edge = |direction| {
            orb_edge(provider, body, target_deg, jd, direction, config, deadline)
        };
        let enter = edge(SearchDirection::Backward);
        let leave = edge(SearchDirection::Forward);
        (enter.map(|t| jd - t), leave.map(|t| t - jd))
    } else {
        (None, None)
    };

    TransitEvent {
        body,
        target_longitude_deg: target_deg,
        jd_tdb: jd,
        is_retrograde: angular_velocity < 0.0,
        angular_velocity,
        approach_duration_days: approach,
        separation_duration_days: separation,
    }
}

#[allow(clippy::too_many_arguments)]
fn transits_between(
    provider: &dyn PositionProvider,
    body: Body,
    target_deg: f64,
    jd_start: f64,
    jd_end: f64,
    max_crossings: usize,
    config: &TransitConfig,
    deadline: &Deadline,
) -> Result<TransitSearch, SearchError> {
    let mut events = Vec::new();
    let mut notes = Vec::new();
    let f = |jd: f64| offset_from_target(provider, body, target_deg, jd);

    let truncation = scan_pairs(
        provider,
        body,
        jd_start,
        jd_end,
        body.scan_step_days(),
        &config.scan,
        deadline,
        &mut notes,
        |a, b, notes| {
            let f_a = shortest_diff(target_deg, a.pos.longitude_deg);
            let f_b = shortest_diff(target_deg, b.pos.longitude_deg);
            // An exact hit on `a` was already reported as the previous pair's
            // `b`, or sits on `jd_start`, which is exclusive.
            let crossing = if f_b == 0.0 {
                Some(b.jd)
            } else if is_genuine_crossing(f_a, f_b) {
                refine_crossing(a, b, f, config.precision_deg, config.max_iterations, notes)
            } else {
                None
            };

            if let Some(jd) = crossing {
                events.push(build_event(
                    provider, body, target_deg, jd, a, b, config, deadline, notes,
                ));
                if events.len() >= max_crossings {
                    return Flow::Stop;
                }
            }
            Flow::Continue
        },
    );

    debug!(
        ?body,
        target_deg,
        jd_start,
        jd_end,
        found = events.len(),
        truncated = truncation.is_some(),
        "transit scan finished"
    );
    finish(events, notes, truncation)
}

fn validate_inputs(target_deg: f64, config: &TransitConfig) -> Result<f64, SearchError> {
    config.validate().map_err(SearchError::InvalidConfig)?;
    if !target_deg.is_finite() {
        return Err(SearchError::InvalidConfig("target longitude must be finite"));
    }
    Ok(normalize_deg(target_deg))
}

/// Find up to `max_crossings` crossings of `target_deg` strictly after
/// `jd_start`.
///
/// Scans at most a few full body cycles. Crossings come back in
/// chronological order.
pub fn find_next_transit(
    provider: &dyn PositionProvider,
    body: Body,
    target_deg: f64,
    jd_start: f64,
    max_crossings: usize,
    config: &TransitConfig,
    deadline: &Deadline,
) -> Result<TransitSearch, SearchError> {
    let target = validate_inputs(target_deg, config)?;
    if max_crossings == 0 {
        return Err(SearchError::InvalidConfig("max_crossings must be > 0"));
    }
    if !jd_start.is_finite() {
        return Err(SearchError::InvalidConfig("start must be finite"));
    }
    let cycles = max_crossings.min(MAX_HORIZON_CYCLES) as f64;
    let jd_end = jd_start + body.scan_horizon_days() * cycles;
    transits_between(
        provider,
        body,
        target,
        jd_start,
        jd_end,
        max_crossings,
        config,
        deadline,
    )
}

/// Find every crossing of `target_deg` in `(jd_start, jd_end]`. The start is
/// exclusive so consecutive ranges never report a crossing twice.
pub fn search_transits(
    provider: &dyn PositionProvider,
    body: Body,
    target_deg: f64,
    jd_start: f64,
    jd_end: f64,
    config: &TransitConfig,
    deadline: &Deadline,
) -> Result<TransitSearch, SearchError> {
    let target = validate_inputs(target_deg, config)?;
    validate_range(jd_start, jd_end)?;
    transits_between(
        provider,
        body,
        target,
        jd_start,
        jd_end,
        usize::MAX,
        config,
        deadline,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kairos_core::BodyPosition;

    use super::*;

    /// Longitude moving at a constant speed from a fixed epoch.
    struct Uniform {
        lon0: f64,
        speed: f64,
    }

    impl PositionProvider for Uniform {
        fn position(&self, _body: Body, jd: f64) -> Result<BodyPosition, ProviderError> {
            Ok(BodyPosition {
                longitude_deg: normalize_deg(self.lon0 + self.speed * jd),
                latitude_deg: 0.0,
                distance: 1.0,
                angular_velocity: self.speed,
            })
        }
    }

    #[test]
    fn crossing_across_seam() {
        let p = Uniform {
            lon0: 355.0,
            speed: 1.0,
        };
        let r = find_next_transit(
            &p,
            Body::Sun,
            2.0,
            0.0,
            1,
            &TransitConfig::default(),
            &Deadline::none(),
        )
        .unwrap();
        assert_eq!(r.events.len(), 1);
        assert!((r.events[0].jd_tdb - 7.0).abs() < 1e-5);
    }

    #[test]
    fn orb_durations_symmetric_for_uniform_motion() {
        let p = Uniform {
            lon0: 80.0,
            speed: 1.0,
        };
        let r = find_next_transit(
            &p,
            Body::Sun,
            90.0,
            0.0,
            1,
            &TransitConfig::default(),
            &Deadline::none(),
        )
        .unwrap();
        let e = r.events[0];
        assert!((e.approach_duration_days.unwrap() - 1.0).abs() < 1e-4);
        assert!((e.separation_duration_days.unwrap() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn target_is_normalized() {
        let p = Uniform {
            lon0: 80.0,
            speed: 1.0,
        };
        let r = find_next_transit(
            &p,
            Body::Sun,
            450.0,
            0.0,
            1,
            &TransitConfig::exact_only(),
            &Deadline::none(),
        )
        .unwrap();
        assert!((r.events[0].target_longitude_deg - 90.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_crossings() {
        let p = Uniform {
            lon0: 0.0,
            speed: 1.0,
        };
        let r = find_next_transit(
            &p,
            Body::Sun,
            10.0,
            0.0,
            0,
            &TransitConfig::default(),
            &Deadline::none(),
        );
        assert!(matches!(r, Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn crossing_on_start_instant_is_excluded() {
        // Exactly on the target at JD 0; the next pass is a year later.
        let p = Uniform {
            lon0: 90.0,
            speed: 1.0,
        };
        let c = TransitConfig::exact_only();
        let next = find_next_transit(&p, Body::Sun, 90.0, 0.0, 1, &c, &Deadline::none()).unwrap();
        assert!((next.events[0].jd_tdb - 360.0).abs() < 1e-5);

        let range = search_transits(&p, Body::Sun, 90.0, 0.0, 360.0, &c, &Deadline::none())
            .unwrap();
        assert_eq!(range.events.len(), 1);
        assert!((range.events[0].jd_tdb - 360.0).abs() < 1e-5);
    }

    /// Parked on the target, so the orb is never left.
    struct Parked {
        calls: AtomicUsize,
    }

    impl PositionProvider for Parked {
        fn position(&self, _body: Body, _jd: f64) -> Result<BodyPosition, ProviderError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(BodyPosition {
                longitude_deg: 90.0,
                latitude_deg: 0.0,
                distance: 1.0,
                angular_velocity: 0.0,
            })
        }
    }

    #[test]
    fn orb_edge_stops_at_deadline() {
        let p = Parked {
            calls: AtomicUsize::new(0),
        };
        let c = TransitConfig::default();
        let fwd = SearchDirection::Forward;
        assert_eq!(orb_edge(&p, Body::Mars, 90.0, 0.0, fwd, &c, &Deadline::none()), None);
        assert!(p.calls.load(Ordering::Relaxed) >= 400);

        p.calls.store(0, Ordering::Relaxed);
        let expired = Deadline::after(std::time::Duration::ZERO);
        assert_eq!(orb_edge(&p, Body::Mars, 90.0, 0.0, fwd, &c, &expired), None);
        assert_eq!(p.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn range_search_counts_every_pass() {
        // 1°/day over 1000 days: day 10, day 370, day 730.
        let p = Uniform {
            lon0: 80.0,
            speed: 1.0,
        };
        let r = search_transits(
            &p,
            Body::Sun,
            90.0,
            0.0,
            1000.0,
            &TransitConfig::exact_only(),
            &Deadline::none(),
        )
        .unwrap();
        assert_eq!(r.events.len(), 3);
        assert!(r.is_complete());
    }
}
