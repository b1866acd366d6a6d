//! Tolerance boundaries and catalogue loading from disk.

use std::io::Write;
use std::sync::Arc;

use kairos_core::{Body, SECONDS_PER_DAY};
use kairos_search::{StationEvent, StationType, TransitEvent};
use kairos_validate::{
    CheckKind, ObservedEvent, ReferenceCatalogue, ReferenceRecord, ValidateError, Validator,
    ValidatorConfig, validate,
};

const REF_JD: f64 = 2_460_310.25;

fn catalogue() -> ReferenceCatalogue {
    ReferenceCatalogue::new(
        "test-1",
        vec![ReferenceRecord {
            kind: CheckKind::Transit,
            body: Some(Body::Mars),
            jd_tdb: REF_JD,
            longitude_deg: Some(90.0),
            magnitude: None,
            source: "synthetic".into(),
        }],
    )
    .unwrap()
}

fn mars_transit(offset_s: f64) -> TransitEvent {
    TransitEvent {
        body: Body::Mars,
        target_longitude_deg: 90.0,
        jd_tdb: REF_JD + offset_s / SECONDS_PER_DAY,
        is_retrograde: false,
        angular_velocity: 0.5,
        approach_duration_days: None,
        separation_duration_days: None,
    }
}

#[test]
fn exactly_at_tolerance_passes() {
    let config = ValidatorConfig::default();
    let tol = config.transit_tolerance_s;
    let r = validate(
        &ObservedEvent::from(&mars_transit(tol)),
        &catalogue(),
        &config,
    );
    assert!(r.is_valid, "{r:?}");
    assert!((r.timing_error_s.unwrap() - tol).abs() < 1e-3);
}

#[test]
fn one_second_over_tolerance_fails() {
    let config = ValidatorConfig::default();
    let tol = config.transit_tolerance_s;
    let r = validate(
        &ObservedEvent::from(&mars_transit(-(tol + 1.0))),
        &catalogue(),
        &config,
    );
    assert!(!r.is_valid);
    assert!(r.has_reference());
}

#[test]
fn other_body_has_no_reference() {
    let mut event = ObservedEvent::from(&mars_transit(0.0));
    event.body = Some(Body::Venus);
    let r = validate(&event, &catalogue(), &ValidatorConfig::default());
    assert!(!r.is_valid);
    assert!(r.timing_error_s.is_none());
}

#[test]
fn validator_reports_over_history() {
    let validator = Validator::new(
        Arc::new(catalogue()),
        ValidatorConfig {
            history_window: 3,
            ..Default::default()
        },
    )
    .unwrap();
    for offset in [10.0, 20.0, 500.0, 30.0] {
        validator.validate(&ObservedEvent::from(&mars_transit(offset)));
    }
    let station = StationEvent {
        body: Body::Mars,
        jd_tdb: REF_JD,
        longitude_deg: 90.0,
        station_type: StationType::StationRetrograde,
    };
    validator.validate(&ObservedEvent::from(&station));

    let m = validator.report();
    // Window holds the last three: 500 s (fail), 30 s (pass), station (no reference).
    assert_eq!(m.total, 3);
    assert_eq!(m.passed, 1);
    assert_eq!(m.missing_reference, 1);
    assert!((m.max_timing_error_s.unwrap() - 500.0).abs() < 1e-3);

    validator.reset_history();
    assert_eq!(validator.report().total, 0);
}

#[test]
fn catalogue_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"version": "2024.1", "records": [
            {{"kind": "eclipse", "jd_tdb": 2460409.2627, "magnitude": 1.0566, "source": "canon"}}
        ]}}"#
    )
    .unwrap();
    let cat = ReferenceCatalogue::load(file.path()).unwrap();
    assert_eq!(cat.version(), "2024.1");
    assert_eq!(cat.len(), 1);
}

#[test]
fn malformed_catalogue_is_rejected() {
    let text = r#"{"version": "x", "records": [{"kind": "comet"}]}"#;
    let err = ReferenceCatalogue::from_json_str(text).unwrap_err();
    assert!(matches!(err, ValidateError::Parse(_)));
}
