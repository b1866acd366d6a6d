//! Locator integration tests against synthetic analytic providers.
//!
//! Every provider here is a closed-form longitude function, so expected
//! crossing times are known exactly and no ephemeris files are needed.

use kairos_core::{
    Body, BodyPosition, Deadline, EclipseKind, EclipseSubtype, GlobalEclipse, PositionProvider,
    ProviderError, SearchDirection, normalize_deg,
};
use kairos_search::{
    EclipseConfig, SearchError, SearchNote, StationConfig, StationType, TransitConfig, Truncation,
    find_next_transit, search_eclipses_in_range, search_stations, search_transits,
};

/// Longitude as an arbitrary function of time; speed by central difference.
struct Analytic<F> {
    lon: F,
    vectorized: bool,
}

impl<F: Fn(f64) -> f64 + Send + Sync> Analytic<F> {
    fn new(lon: F) -> Self {
        Self {
            lon,
            vectorized: false,
        }
    }
}

impl<F: Fn(f64) -> f64 + Send + Sync> PositionProvider for Analytic<F> {
    fn position(&self, _body: Body, jd: f64) -> Result<BodyPosition, ProviderError> {
        let h = 1e-5;
        Ok(BodyPosition {
            longitude_deg: normalize_deg((self.lon)(jd)),
            latitude_deg: 0.0,
            distance: 1.0,
            angular_velocity: ((self.lon)(jd + h) - (self.lon)(jd - h)) / (2.0 * h),
        })
    }

    fn supports_vectorized(&self) -> bool {
        self.vectorized
    }
}

fn cubic_loop(t: f64) -> f64 {
    let u = t - 50.0;
    90.0 + (u * u * u - 400.0 * u) / 2000.0
}

#[test]
fn direct_motion_single_event() {
    let p = Analytic::new(|t| 85.0 + 0.5 * t);
    let r = find_next_transit(
        &p,
        Body::Mars,
        90.0,
        0.0,
        1,
        &TransitConfig::default(),
        &Deadline::none(),
    )
    .expect("search should succeed");
    assert_eq!(r.events.len(), 1);
    let e = r.events[0];
    assert!((e.jd_tdb - 10.0).abs() < 1e-4, "got {}", e.jd_tdb);
    assert!(!e.is_retrograde);
    assert!((e.angular_velocity - 0.5).abs() < 1e-6);
    // 1° orb at 0.5°/day is two days either side.
    assert!((e.approach_duration_days.unwrap() - 2.0).abs() < 1e-3);
    assert!((e.separation_duration_days.unwrap() - 2.0).abs() < 1e-3);
}

#[test]
fn retrograde_motion_single_event() {
    let p = Analytic::new(|t| 95.0 - 0.5 * t);
    let r = find_next_transit(
        &p,
        Body::Mars,
        90.0,
        0.0,
        1,
        &TransitConfig::default(),
        &Deadline::none(),
    )
    .expect("search should succeed");
    assert_eq!(r.events.len(), 1);
    assert!((r.events[0].jd_tdb - 10.0).abs() < 1e-4);
    assert!(r.events[0].is_retrograde);
}

#[test]
fn retrograde_loop_yields_three_crossings() {
    let p = Analytic::new(cubic_loop);
    let r = find_next_transit(
        &p,
        Body::Mars,
        90.0,
        0.0,
        3,
        &TransitConfig::default(),
        &Deadline::none(),
    )
    .expect("search should succeed");

    assert_eq!(r.events.len(), 3);
    let expected = [(30.0, false), (50.0, true), (70.0, false)];
    for (e, (jd, retro)) in r.events.iter().zip(expected) {
        assert!((e.jd_tdb - jd).abs() < 1e-4, "got {}, want {jd}", e.jd_tdb);
        assert_eq!(e.is_retrograde, retro);
    }
    assert!(r.events.windows(2).all(|w| w[0].jd_tdb < w[1].jd_tdb));
}

#[test]
fn vectorized_scan_gives_identical_events() {
    let plain = Analytic::new(cubic_loop);
    let batched = Analytic {
        lon: cubic_loop,
        vectorized: true,
    };
    let config = TransitConfig::exact_only();
    let a = search_transits(&plain, Body::Mars, 90.0, 0.0, 100.0, &config, &Deadline::none())
        .unwrap();
    let b = search_transits(&batched, Body::Mars, 90.0, 0.0, 100.0, &config, &Deadline::none())
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn stations_bracket_the_loop() {
    // Speed zero where 3u² = 400, u = ±11.547.
    let p = Analytic::new(cubic_loop);
    let r = search_stations(
        &p,
        Body::Mars,
        0.0,
        100.0,
        &StationConfig::default(),
        &Deadline::none(),
    )
    .unwrap();
    assert_eq!(r.events.len(), 2);
    let u = (400.0_f64 / 3.0).sqrt();
    assert_eq!(r.events[0].station_type, StationType::StationRetrograde);
    assert!((r.events[0].jd_tdb - (50.0 - u)).abs() < 1e-3);
    assert_eq!(r.events[1].station_type, StationType::StationDirect);
    assert!((r.events[1].jd_tdb - (50.0 + u)).abs() < 1e-3);
}

/// 1°/day from 80°, with one bad sample near day 3 and an outage from day 500.
struct Flaky;

impl PositionProvider for Flaky {
    fn position(&self, _body: Body, jd: f64) -> Result<BodyPosition, ProviderError> {
        if (2.5..3.5).contains(&jd) {
            return Err(ProviderError::Fault("checksum mismatch".into()));
        }
        if jd >= 500.0 {
            return Err(ProviderError::Unavailable("kernel unloaded".into()));
        }
        Ok(BodyPosition {
            longitude_deg: normalize_deg(80.0 + jd),
            latitude_deg: 0.0,
            distance: 1.0,
            angular_velocity: 1.0,
        })
    }

    fn global_eclipse_search(
        &self,
        kind: EclipseKind,
        jd: f64,
        _direction: SearchDirection,
    ) -> Result<Option<GlobalEclipse>, ProviderError> {
        let offset = if kind == EclipseKind::Lunar { 14.0 } else { 0.0 };
        let jd_max = (jd / 177.0).ceil() * 177.0 + offset;
        if jd_max >= 500.0 {
            return Err(ProviderError::Unavailable("kernel unloaded".into()));
        }
        Ok(Some(GlobalEclipse {
            kind,
            subtype: EclipseSubtype::Partial,
            jd_max,
            magnitude: 0.4,
            obscuration: None,
            saros_series: None,
        }))
    }
}

#[test]
fn bad_sample_is_skipped_and_noted() {
    let r = find_next_transit(
        &Flaky,
        Body::Sun,
        90.0,
        0.0,
        1,
        &TransitConfig::exact_only(),
        &Deadline::none(),
    )
    .unwrap();
    assert!((r.events[0].jd_tdb - 10.0).abs() < 1e-4);
    assert!(
        r.notes
            .iter()
            .any(|n| matches!(n, SearchNote::ProviderFault { .. }))
    );
    assert!(!r.is_complete());
}

#[test]
fn outage_keeps_earlier_crossings() {
    let r = search_transits(
        &Flaky,
        Body::Sun,
        90.0,
        0.0,
        1000.0,
        &TransitConfig::exact_only(),
        &Deadline::none(),
    )
    .expect("partial results are not an error");
    // Day 10 and day 370 precede the outage; day 730 does not.
    assert_eq!(r.events.len(), 2);
    match r.truncation {
        Some(Truncation::ProviderUnavailable { at_jd, .. }) => assert!(at_jd >= 500.0),
        other => panic!("expected provider truncation, got {other:?}"),
    }
}

#[test]
fn outage_before_any_crossing_is_error() {
    let r = search_transits(
        &Flaky,
        Body::Sun,
        0.0,
        600.0,
        1000.0,
        &TransitConfig::exact_only(),
        &Deadline::none(),
    );
    assert!(matches!(r, Err(SearchError::ProviderUnavailable { .. })));
}

#[test]
fn eclipse_range_truncates_partway() {
    let r = search_eclipses_in_range(
        &Flaky,
        0.0,
        1000.0,
        None,
        &EclipseConfig::default(),
        &Deadline::none(),
    )
    .unwrap();
    let jds: Vec<f64> = r.events.iter().map(|e| e.jd_max).collect();
    assert_eq!(jds, vec![0.0, 14.0, 177.0, 191.0, 354.0, 368.0]);
    assert!(matches!(
        r.truncation,
        Some(Truncation::ProviderUnavailable { .. })
    ));
}

#[test]
fn expired_deadline_returns_partial() {
    let p = Analytic::new(|t| t);
    let r = search_transits(
        &p,
        Body::Sun,
        90.0,
        0.0,
        1000.0,
        &TransitConfig::exact_only(),
        &Deadline::after(std::time::Duration::ZERO),
    )
    .unwrap();
    assert!(r.events.is_empty());
    assert!(matches!(
        r.truncation,
        Some(Truncation::DeadlineExceeded { .. })
    ));
}
