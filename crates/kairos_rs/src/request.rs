//! Batch request and response types.

use kairos_core::{Body, EclipseKind, EclipseSubtype, GeoLocation};
use kairos_search::{EclipseSearch, IngressSearch, Sign, StationSearch, TransitSearch};
use serde::{Deserialize, Serialize};

/// One locator call inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BatchRequest {
    NextTransit {
        body: Body,
        target_deg: f64,
        jd_start: f64,
        max_crossings: usize,
    },
    SignIngress {
        body: Body,
        jd_start: f64,
        #[serde(default)]
        target_sign: Option<Sign>,
    },
    NextStation {
        body: Body,
        jd_start: f64,
    },
    NextEclipse {
        kind: EclipseKind,
        jd_start: f64,
        #[serde(default)]
        subtype: Option<EclipseSubtype>,
        #[serde(default)]
        location: Option<GeoLocation>,
    },
    EclipsesInRange {
        jd_start: f64,
        jd_end: f64,
        #[serde(default)]
        kind: Option<EclipseKind>,
    },
}

impl BatchRequest {
    /// Body sampled by the request, if it samples one.
    pub fn body(&self) -> Option<Body> {
        match self {
            Self::NextTransit { body, .. }
            | Self::SignIngress { body, .. }
            | Self::NextStation { body, .. } => Some(*body),
            Self::NextEclipse { .. } | Self::EclipsesInRange { .. } => None,
        }
    }
}

/// Result of one [`BatchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum BatchResponse {
    Transits(TransitSearch),
    Ingresses(IngressSearch),
    Stations(StationSearch),
    Eclipses(EclipseSearch),
}

impl BatchResponse {
    /// Number of events found.
    pub fn len(&self) -> usize {
        match self {
            Self::Transits(s) => s.events.len(),
            Self::Ingresses(s) => s.events.len(),
            Self::Stations(s) => s.events.len(),
            Self::Eclipses(s) => s.events.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the underlying search was cut short.
    pub fn is_truncated(&self) -> bool {
        match self {
            Self::Transits(s) => s.truncation.is_some(),
            Self::Ingresses(s) => s.truncation.is_some(),
            Self::Stations(s) => s.truncation.is_some(),
            Self::Eclipses(s) => s.truncation.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_json_shape() {
        let r: BatchRequest = serde_json::from_str(
            r#"{"op": "sign_ingress", "body": "venus", "jd_start": 2460000.5}"#,
        )
        .unwrap();
        assert_eq!(
            r,
            BatchRequest::SignIngress {
                body: Body::Venus,
                jd_start: 2_460_000.5,
                target_sign: None,
            }
        );
        assert_eq!(r.body(), Some(Body::Venus));
    }

    #[test]
    fn eclipse_request_has_no_body() {
        let r = BatchRequest::EclipsesInRange {
            jd_start: 0.0,
            jd_end: 10.0,
            kind: None,
        };
        assert_eq!(r.body(), None);
    }
}
