//! Sign ingress search engine.
//!
//! Same coarse scan as transits, specialised to the twelve 30°-aligned
//! boundaries. A pair of samples in different signs brackets an ingress;
//! the boundary is the start of the entered sign for forward motion and the
//! start of the departed sign for backward motion. Bisection then runs on
//! f(t) = shortest_diff(boundary, lon(t)).

use kairos_core::{Body, Deadline, PositionProvider, is_genuine_crossing, shortest_diff};
use tracing::debug;

use crate::error::SearchError;
use crate::ingress_types::{IngressConfig, IngressEvent, IngressSearch, Sign};
use crate::scan::{Flow, Sample, finish, scan_pairs, validate_range};
use crate::transit::refine_crossing;

/// Sign boundary crossed between two samples, with the sign entered and
/// whether the crossing was backward.
fn boundary_between(a: &Sample, b: &Sample) -> Option<(f64, Sign, bool)> {
    let sign_a = Sign::from_longitude(a.pos.longitude_deg);
    let sign_b = Sign::from_longitude(b.pos.longitude_deg);
    if sign_a == sign_b {
        return None;
    }
    let backward = shortest_diff(a.pos.longitude_deg, b.pos.longitude_deg) < 0.0;
    let boundary = if backward {
        sign_a.start_deg()
    } else {
        sign_b.start_deg()
    };
    Some((boundary, sign_b, backward))
}

#[allow(clippy::too_many_arguments)]
fn ingresses_between(
    provider: &dyn PositionProvider,
    body: Body,
    jd_start: f64,
    jd_end: f64,
    target: Option<Sign>,
    limit: usize,
    config: &IngressConfig,
    deadline: &Deadline,
) -> Result<IngressSearch, SearchError> {
    config.validate().map_err(SearchError::InvalidConfig)?;
    let mut events = Vec::new();
    let mut notes = Vec::new();

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
            let Some((boundary, sign, backward)) = boundary_between(a, b) else {
                return Flow::Continue;
            };
            if target.is_some_and(|t| t != sign) {
                return Flow::Continue;
            }
            let f_a = shortest_diff(boundary, a.pos.longitude_deg);
            let f_b = shortest_diff(boundary, b.pos.longitude_deg);
            let f = |jd: f64| {
                provider
                    .position(body, jd)
                    .map(|p| shortest_diff(boundary, p.longitude_deg))
            };
            let found = if f_b == 0.0 {
                Some(b.jd)
            } else if (f_a == 0.0 && a.jd > jd_start) || is_genuine_crossing(f_a, f_b) {
                refine_crossing(a, b, f, config.precision_deg, config.max_iterations, notes)
            } else {
                None
            };

            if let Some(jd_tdb) = found {
                events.push(IngressEvent {
                    body,
                    sign,
                    boundary_deg: boundary,
                    jd_tdb,
                    is_retrograde: backward,
                });
                if events.len() >= limit {
                    return Flow::Stop;
                }
            }
            Flow::Continue
        },
    );

    debug!(
        ?body,
        ?target,
        jd_start,
        jd_end,
        found = events.len(),
        "ingress scan finished"
    );
    finish(events, notes, truncation)
}

/// Find the next ingress of `body` strictly after `jd_start`, optionally into a
/// specific sign. Searches one body horizon; an empty result means no
/// ingress in that span.
pub fn find_sign_ingress(
    provider: &dyn PositionProvider,
    body: Body,
    jd_start: f64,
    target: Option<Sign>,
    config: &IngressConfig,
    deadline: &Deadline,
) -> Result<IngressSearch, SearchError> {
    if !jd_start.is_finite() {
        return Err(SearchError::InvalidConfig("start must be finite"));
    }
    let jd_end = jd_start + body.scan_horizon_days();
    ingresses_between(provider, body, jd_start, jd_end, target, 1, config, deadline)
}

/// All ingresses of `body` in `(jd_start, jd_end]`, chronological. As with
/// transits the start is exclusive.
pub fn search_sign_ingresses(
    provider: &dyn PositionProvider,
    body: Body,
    jd_start: f64,
    jd_end: f64,
    config: &IngressConfig,
    deadline: &Deadline,
) -> Result<IngressSearch, SearchError> {
    validate_range(jd_start, jd_end)?;
    ingresses_between(
        provider,
        body,
        jd_start,
        jd_end,
        None,
        usize::MAX,
        config,
        deadline,
    )
}
