//! Reference catalogue of known events.
//!
//! A catalogue is a versioned JSON document:
//!
//! ```json
//! {
//!   "version": "2024.1",
//!   "records": [
//!     { "kind": "eclipse", "jd_tdb": 2460409.2627, "magnitude": 1.0566,
//!       "source": "NASA Five Millennium Canon" }
//!   ]
//! }
//! ```
//!
//! It is loaded once and is read-only afterwards. Records are kept sorted by
//! time so the closest-record lookup is a binary search.

use std::path::Path;

use kairos_core::Body;
use serde::{Deserialize, Serialize};

use crate::error::ValidateError;

/// Which kind of event a record (and a check) is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Transit,
    Ingress,
    Station,
    Eclipse,
}

/// One known event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub kind: CheckKind,
    /// Body the record is about; `None` matches any body (eclipses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    /// Event time as Julian Date (TDB).
    pub jd_tdb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    /// Where the value came from.
    pub source: String,
}

impl ReferenceRecord {
    fn validate(&self) -> Result<(), &'static str> {
        if !self.jd_tdb.is_finite() {
            return Err("jd_tdb must be finite");
        }
        if self.longitude_deg.is_some_and(|l| !l.is_finite()) {
            return Err("longitude_deg must be finite");
        }
        if self.magnitude.is_some_and(|m| !m.is_finite()) {
            return Err("magnitude must be finite");
        }
        if self.source.trim().is_empty() {
            return Err("source must not be empty");
        }
        Ok(())
    }

    fn matches(&self, kind: CheckKind, body: Option<Body>) -> bool {
        self.kind == kind
            && match (self.body, body) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCatalogue {
    version: String,
    records: Vec<ReferenceRecord>,
}

impl ReferenceCatalogue {
    /// Build a catalogue, validating and time-sorting the records.
    pub fn new(
        version: impl Into<String>,
        mut records: Vec<ReferenceRecord>,
    ) -> Result<Self, ValidateError> {
        for (index, record) in records.iter().enumerate() {
            record
                .validate()
                .map_err(|reason| ValidateError::InvalidRecord { index, reason })?;
        }
        records.sort_by(|a, b| a.jd_tdb.total_cmp(&b.jd_tdb));
        Ok(Self {
            version: version.into(),
            records,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, ValidateError> {
        let raw: ReferenceCatalogue = serde_json::from_str(text)?;
        Self::new(raw.version, raw.records)
    }

    pub fn load(path: &Path) -> Result<Self, ValidateError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The matching record closest in time to `jd_tdb`, if one lies within
    /// `window_days` of it.
    pub fn closest(
        &self,
        kind: CheckKind,
        body: Option<Body>,
        jd_tdb: f64,
        window_days: f64,
    ) -> Option<&ReferenceRecord> {
        let lo = self
            .records
            .partition_point(|r| r.jd_tdb < jd_tdb - window_days);
        let hi = self
            .records
            .partition_point(|r| r.jd_tdb <= jd_tdb + window_days);
        self.records[lo..hi]
            .iter()
            .filter(|r| r.matches(kind, body))
            .min_by(|a, b| {
                (a.jd_tdb - jd_tdb)
                    .abs()
                    .total_cmp(&(b.jd_tdb - jd_tdb).abs())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: CheckKind, body: Option<Body>, jd: f64) -> ReferenceRecord {
        ReferenceRecord {
            kind,
            body,
            jd_tdb: jd,
            longitude_deg: None,
            magnitude: None,
            source: "test".into(),
        }
    }

    #[test]
    fn parses_json_and_sorts() {
        let cat = ReferenceCatalogue::from_json_str(
            r#"{
                "version": "t1",
                "records": [
                    {"kind": "transit", "body": "mars", "jd_tdb": 20.0, "longitude_deg": 90.0, "source": "a"},
                    {"kind": "eclipse", "jd_tdb": 10.0, "magnitude": 1.02, "source": "b"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(cat.version(), "t1");
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.records()[0].kind, CheckKind::Eclipse);
    }

    #[test]
    fn rejects_empty_source() {
        let mut r = record(CheckKind::Transit, None, 1.0);
        r.source = " ".into();
        let err = ReferenceCatalogue::new("v", vec![r]).unwrap_err();
        assert!(matches!(err, ValidateError::InvalidRecord { index: 0, .. }));
    }

    #[test]
    fn closest_respects_kind_body_and_window() {
        let cat = ReferenceCatalogue::new(
            "v",
            vec![
                record(CheckKind::Transit, Some(Body::Mars), 100.0),
                record(CheckKind::Transit, Some(Body::Venus), 100.5),
                record(CheckKind::Transit, Some(Body::Mars), 103.0),
                record(CheckKind::Ingress, Some(Body::Mars), 100.1),
            ],
        )
        .unwrap();
        let hit = cat
            .closest(CheckKind::Transit, Some(Body::Mars), 100.4, 10.0)
            .unwrap();
        assert_eq!(hit.jd_tdb, 100.0);
        assert!(
            cat.closest(CheckKind::Transit, Some(Body::Mars), 200.0, 10.0)
                .is_none()
        );
        assert!(cat.closest(CheckKind::Station, None, 100.0, 10.0).is_none());
    }
}
