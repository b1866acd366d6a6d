//! Eclipse locator.
//!
//! The provider's global-search primitive does the heavy lifting: it steps
//! roughly one lunation at a time and returns an approximate greatest-eclipse
//! instant. This module walks that primitive forward or backward, applies
//! subtype and visibility filters, and optionally refines the instant.
//!
//! Refinement: greatest eclipse is where the Sun–Moon separation (solar) or
//! the Moon–antisolar-point separation (lunar) is smallest, i.e. where its
//! rate changes sign. The rate is a central difference, bisected within a
//! small window around the provider's estimate.

use kairos_core::{
    Body, Deadline, EclipseKind, GlobalEclipse, PositionProvider, ProviderError, SearchDirection,
    angular_separation_deg, normalize_deg,
};
use tracing::{debug, warn};

use crate::eclipse_types::{EclipseConfig, EclipseEvent, EclipseFilter, EclipseSearch};
use crate::error::SearchError;
use crate::event_types::{SearchNote, Truncation};
use crate::scan::{finish, validate_range};
use crate::search_core::{SearchWindow, search};

/// Central-difference half step for the separation rate, in days (~8.6 s).
const RATE_STEP_DAYS: f64 = 1e-4;

/// Cursor advance past each returned eclipse, in days.
const ADVANCE_DAYS: f64 = 1.0;

// ---------------------------------------------------------------------------
// Refinement
// ---------------------------------------------------------------------------

/// Separation that is smallest at greatest eclipse, in degrees.
fn eclipse_separation(
    provider: &dyn PositionProvider,
    kind: EclipseKind,
    jd: f64,
) -> Result<f64, ProviderError> {
    let sun = provider.position(Body::Sun, jd)?;
    let moon = provider.position(Body::Moon, jd)?;
    let (lon, lat) = match kind {
        EclipseKind::Solar => (sun.longitude_deg, sun.latitude_deg),
        EclipseKind::Lunar => (normalize_deg(sun.longitude_deg + 180.0), -sun.latitude_deg),
    };
    Ok(angular_separation_deg(
        lon,
        lat,
        moon.longitude_deg,
        moon.latitude_deg,
    ))
}

/// Bisect the separation rate around the provider's estimate. `None` keeps
/// the estimate; an expired `deadline` abandons refinement without a note.
fn refine_maximum(
    provider: &dyn PositionProvider,
    kind: EclipseKind,
    jd_estimate: f64,
    config: &EclipseConfig,
    deadline: &Deadline,
    notes: &mut Vec<SearchNote>,
) -> Option<f64> {
    let mut expired = false;
    let rate = |jd: f64| {
        if deadline.is_expired() {
            expired = true;
            return Err(ProviderError::Unavailable("deadline exceeded".into()));
        }
        let ahead = eclipse_separation(provider, kind, jd + RATE_STEP_DAYS)?;
        let behind = eclipse_separation(provider, kind, jd - RATE_STEP_DAYS)?;
        Ok((ahead - behind) / (2.0 * RATE_STEP_DAYS))
    };
    let lower = jd_estimate - config.refine_window_days;
    let upper = jd_estimate + config.refine_window_days;
    let window = SearchWindow::new(lower, upper).ok()?;

    let outcome = search(window, rate, config.refine_precision, config.max_iterations);
    if expired {
        return None;
    }
    match outcome {
        Ok(r) if r.found() => r.jd_tdb,
        Ok(r) => {
            notes.push(SearchNote::SearchExhausted {
                lower_jd: lower,
                upper_jd: upper,
                achieved_precision: r.achieved_precision,
            });
            None
        }
        Err(SearchError::Provider(e)) => {
            warn!(?kind, jd_estimate, error = %e, "eclipse refinement failed");
            notes.push(SearchNote::ProviderFault {
                jd_tdb: jd_estimate,
                message: e.to_string(),
            });
            None
        }
        Err(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Provider walk
// ---------------------------------------------------------------------------

/// Accumulated output of one walk over the provider primitive.
#[derive(Default)]
struct Walk {
    events: Vec<EclipseEvent>,
    notes: Vec<SearchNote>,
    truncation: Option<Truncation>,
}

/// Where a walk stops and how many events it wants.
struct WalkBounds {
    start: f64,
    /// Furthest acceptable `jd_max`, in the walk's direction.
    limit: f64,
    direction: SearchDirection,
    max_events: usize,
}

impl WalkBounds {
    fn in_bounds(&self, jd: f64) -> bool {
        match self.direction {
            SearchDirection::Forward => jd >= self.start && jd <= self.limit,
            SearchDirection::Backward => jd <= self.start && jd >= self.limit,
        }
    }

    fn past_limit(&self, jd: f64) -> bool {
        match self.direction {
            SearchDirection::Forward => jd > self.limit,
            SearchDirection::Backward => jd < self.limit,
        }
    }

    /// Next cursor, strictly beyond both the old cursor and the event.
    fn advance(&self, cursor: f64, jd_max: f64) -> f64 {
        match self.direction {
            SearchDirection::Forward => jd_max.max(cursor) + ADVANCE_DAYS,
            SearchDirection::Backward => jd_max.min(cursor) - ADVANCE_DAYS,
        }
    }
}

/// Apply the location filter. `Ok(None)` means not visible.
fn with_local(
    provider: &dyn PositionProvider,
    g: &GlobalEclipse,
    filter: &EclipseFilter,
) -> Result<Option<EclipseEvent>, ProviderError> {
    let mut event = EclipseEvent::from_global(g);
    if let Some(location) = &filter.location {
        let local = provider.local_eclipse_circumstances(g.kind, g.jd_max, location)?;
        if !local.visible {
            return Ok(None);
        }
        event.local = Some(local);
    }
    Ok(Some(event))
}

fn walk_eclipses(
    provider: &dyn PositionProvider,
    kind: EclipseKind,
    bounds: &WalkBounds,
    filter: &EclipseFilter,
    config: &EclipseConfig,
    deadline: &Deadline,
) -> Walk {
    let mut walk = Walk::default();
    let mut cursor = bounds.start;

    while walk.events.len() < bounds.max_events {
        if deadline.is_expired() {
            walk.truncation = Some(Truncation::DeadlineExceeded { at_jd: cursor });
            break;
        }
        if bounds.past_limit(cursor) {
            break;
        }
        let g = match provider.global_eclipse_search(kind, cursor, bounds.direction) {
            Ok(Some(g)) => g,
            Ok(None) => break,
            Err(e) => {
                warn!(?kind, cursor, error = %e, "global eclipse search failed");
                walk.truncation = Some(Truncation::ProviderUnavailable {
                    at_jd: cursor,
                    message: e.to_string(),
                });
                break;
            }
        };
        if bounds.past_limit(g.jd_max) {
            break;
        }
        cursor = bounds.advance(cursor, g.jd_max);

        if !bounds.in_bounds(g.jd_max) || filter.subtype.is_some_and(|st| st != g.subtype) {
            continue;
        }

        let mut event = match with_local(provider, &g, filter) {
            Ok(Some(e)) => e,
            Ok(None) => continue,
            Err(e) if e.is_transient() => {
                walk.notes.push(SearchNote::ProviderFault {
                    jd_tdb: g.jd_max,
                    message: e.to_string(),
                });
                continue;
            }
            Err(e) => {
                walk.truncation = Some(Truncation::ProviderUnavailable {
                    at_jd: g.jd_max,
                    message: e.to_string(),
                });
                break;
            }
        };

        if config.refine
            && let Some(jd) =
                refine_maximum(provider, kind, g.jd_max, config, deadline, &mut walk.notes)
        {
            event.jd_max = jd;
            event.refined = true;
        }
        walk.events.push(event);
    }

    debug!(
        ?kind,
        start = bounds.start,
        limit = bounds.limit,
        found = walk.events.len(),
        "eclipse walk finished"
    );
    walk
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

fn find_eclipse(
    provider: &dyn PositionProvider,
    kind: EclipseKind,
    jd_start: f64,
    direction: SearchDirection,
    filter: &EclipseFilter,
    config: &EclipseConfig,
    deadline: &Deadline,
) -> Result<EclipseSearch, SearchError> {
    config.validate().map_err(SearchError::InvalidConfig)?;
    filter.validate(kind).map_err(SearchError::InvalidConfig)?;
    if !jd_start.is_finite() {
        return Err(SearchError::InvalidConfig("start must be finite"));
    }
    let limit = match direction {
        SearchDirection::Forward => jd_start + config.scan_horizon_days,
        SearchDirection::Backward => jd_start - config.scan_horizon_days,
    };
    let bounds = WalkBounds {
        start: jd_start,
        limit,
        direction,
        max_events: 1,
    };
    let walk = walk_eclipses(provider, kind, &bounds, filter, config, deadline);
    finish(walk.events, walk.notes, walk.truncation)
}

/// Next eclipse of `kind` at or after `jd_start` matching `filter`.
///
/// An empty result means none within `config.scan_horizon_days`.
pub fn find_next_eclipse(
    provider: &dyn PositionProvider,
    kind: EclipseKind,
    jd_start: f64,
    filter: &EclipseFilter,
    config: &EclipseConfig,
    deadline: &Deadline,
) -> Result<EclipseSearch, SearchError> {
    find_eclipse(
        provider,
        kind,
        jd_start,
        SearchDirection::Forward,
        filter,
        config,
        deadline,
    )
}

/// Most recent eclipse of `kind` at or before `jd_start` matching `filter`.
pub fn find_previous_eclipse(
    provider: &dyn PositionProvider,
    kind: EclipseKind,
    jd_start: f64,
    filter: &EclipseFilter,
    config: &EclipseConfig,
    deadline: &Deadline,
) -> Result<EclipseSearch, SearchError> {
    find_eclipse(
        provider,
        kind,
        jd_start,
        SearchDirection::Backward,
        filter,
        config,
        deadline,
    )
}

/// All eclipses with greatest phase in `[jd_start, jd_end]`, of one kind or
/// both, chronological.
///
/// Ranges longer than `config.max_range_days` are rejected up front. If the
/// provider fails partway, events found before the failure are returned
/// with a truncation.
pub fn search_eclipses_in_range(
    provider: &dyn PositionProvider,
    jd_start: f64,
    jd_end: f64,
    kind_filter: Option<EclipseKind>,
    config: &EclipseConfig,
    deadline: &Deadline,
) -> Result<EclipseSearch, SearchError> {
    config.validate().map_err(SearchError::InvalidConfig)?;
    validate_range(jd_start, jd_end)?;
    let span_days = jd_end - jd_start;
    if span_days > config.max_range_days {
        return Err(SearchError::RangeTooLong {
            span_days,
            max_days: config.max_range_days,
        });
    }

    let kinds: &[EclipseKind] = match kind_filter {
        Some(EclipseKind::Solar) => &[EclipseKind::Solar],
        Some(EclipseKind::Lunar) => &[EclipseKind::Lunar],
        None => &[EclipseKind::Solar, EclipseKind::Lunar],
    };
    let bounds = WalkBounds {
        start: jd_start,
        limit: jd_end,
        direction: SearchDirection::Forward,
        max_events: usize::MAX,
    };

    let mut merged = Walk::default();
    for &kind in kinds {
        let walk = walk_eclipses(
            provider,
            kind,
            &bounds,
            &EclipseFilter::default(),
            config,
            deadline,
        );
        merged.events.extend(walk.events);
        merged.notes.extend(walk.notes);
        // Keep the earliest truncation: coverage is only complete up to it.
        merged.truncation = match (merged.truncation.take(), walk.truncation) {
            (Some(a), Some(b)) => Some(if b.at_jd() < a.at_jd() { b } else { a }),
            (a, b) => a.or(b),
        };
    }
    merged.events.sort_by(|a, b| a.jd_max.total_cmp(&b.jd_max));
    finish(merged.events, merged.notes, merged.truncation)
}
