//! Station search engine.
//!
//! Finds when a body's ecliptic longitude speed crosses zero. Same coarse
//! scan as transits, with f(t) = angular_velocity(t). Speed does not wrap,
//! so any sign change between samples is a bracket.

use kairos_core::{Body, Deadline, PositionProvider};
use tracing::debug;

use crate::error::SearchError;
use crate::scan::{Flow, finish, scan_pairs, validate_range};
use crate::stationary_types::{StationConfig, StationEvent, StationSearch, StationType};
use crate::transit::refine_crossing;

// ---------------------------------------------------------------------------
// Body validation
// ---------------------------------------------------------------------------

/// Sun and Moon always move eastward geocentrically; Earth has no
/// geocentric longitude.
fn validate_station_body(body: Body) -> Result<(), SearchError> {
    if body.can_station() {
        Ok(())
    } else {
        Err(SearchError::InvalidConfig(
            "Sun, Moon, and Earth do not have stations",
        ))
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn stations_between(
    provider: &dyn PositionProvider,
    body: Body,
    jd_start: f64,
    jd_end: f64,
    limit: usize,
    config: &StationConfig,
    deadline: &Deadline,
) -> Result<StationSearch, SearchError> {
    config.validate().map_err(SearchError::InvalidConfig)?;
    validate_station_body(body)?;

    let mut events = Vec::new();
    let mut notes = Vec::new();
    let speed_at = |jd: f64| provider.position(body, jd).map(|p| p.angular_velocity);

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
            let (v_a, v_b) = (a.pos.angular_velocity, b.pos.angular_velocity);
            let found = if v_b == 0.0 && v_a != 0.0 {
                Some(b.jd)
            } else if v_a * v_b < 0.0 {
                refine_crossing(a, b, speed_at, config.precision, config.max_iterations, notes)
            } else {
                None
            };

            if let Some(jd_tdb) = found {
                let longitude_deg = provider
                    .position(body, jd_tdb)
                    .map_or(b.pos.longitude_deg, |p| p.longitude_deg);
                let station_type = if v_a > 0.0 {
                    StationType::StationRetrograde
                } else {
                    StationType::StationDirect
                };
                events.push(StationEvent {
                    body,
                    jd_tdb,
                    longitude_deg,
                    station_type,
                });
                if events.len() >= limit {
                    return Flow::Stop;
                }
            }
            Flow::Continue
        },
    );

    debug!(?body, jd_start, jd_end, found = events.len(), "station scan finished");
    finish(events, notes, truncation)
}

/// Find the next station strictly after `jd_start` within one body horizon.
pub fn next_station(
    provider: &dyn PositionProvider,
    body: Body,
    jd_start: f64,
    config: &StationConfig,
    deadline: &Deadline,
) -> Result<StationSearch, SearchError> {
    if !jd_start.is_finite() {
        return Err(SearchError::InvalidConfig("start must be finite"));
    }
    let jd_end = jd_start + body.scan_horizon_days();
    stations_between(provider, body, jd_start, jd_end, 1, config, deadline)
}

/// All stations in `(jd_start, jd_end]`, chronological.
pub fn search_stations(
    provider: &dyn PositionProvider,
    body: Body,
    jd_start: f64,
    jd_end: f64,
    config: &StationConfig,
    deadline: &Deadline,
) -> Result<StationSearch, SearchError> {
    validate_range(jd_start, jd_end)?;
    stations_between(
        provider,
        body,
        jd_start,
        jd_end,
        usize::MAX,
        config,
        deadline,
    )
}

#[cfg(test)]
mod tests {
    use kairos_core::{BodyPosition, ProviderError};

    use super::*;

    /// lon = 100 + 10 sin(2πt/100): stations at t = 25 (retro) and 75 (direct).
    struct Swing;

    impl PositionProvider for Swing {
        fn position(&self, _body: Body, jd: f64) -> Result<BodyPosition, ProviderError> {
            let w = std::f64::consts::TAU / 100.0;
            Ok(BodyPosition {
                longitude_deg: 100.0 + 10.0 * (w * jd).sin(),
                latitude_deg: 0.0,
                distance: 1.0,
                angular_velocity: 10.0 * w * (w * jd).cos(),
            })
        }
    }

    #[test]
    fn rejects_sun() {
        let r = next_station(
            &Swing,
            Body::Sun,
            0.0,
            &StationConfig::default(),
            &Deadline::none(),
        );
        assert!(matches!(r, Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn next_station_is_retrograde() {
        let r = next_station(
            &Swing,
            Body::Mars,
            0.0,
            &StationConfig::default(),
            &Deadline::none(),
        )
        .unwrap();
        let e = r.first().unwrap();
        assert_eq!(e.station_type, StationType::StationRetrograde);
        assert!((e.jd_tdb - 25.0).abs() < 1e-3);
        assert!((e.longitude_deg - 110.0).abs() < 1e-6);
    }

    #[test]
    fn range_alternates() {
        let r = search_stations(
            &Swing,
            Body::Mars,
            0.0,
            200.0,
            &StationConfig::default(),
            &Deadline::none(),
        )
        .unwrap();
        let types: Vec<_> = r.events.iter().map(|e| e.station_type).collect();
        assert_eq!(
            types,
            vec![
                StationType::StationRetrograde,
                StationType::StationDirect,
                StationType::StationRetrograde,
                StationType::StationDirect,
            ]
        );
    }
}
