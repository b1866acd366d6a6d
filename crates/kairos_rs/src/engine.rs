//! The caller-facing event engine.
//!
//! An [`EventEngine`] owns everything a locator call needs: the position
//! provider, the settings-derived component configs, the tiered cache, the
//! batch worker pool, and optionally a reference catalogue. It is built once
//! and passed around explicitly; cloning is cheap and shares all of it.
//!
//! Every locator call goes through the cache. Keys hash the operation name,
//! its arguments and the search settings; only complete results (no skipped
//! samples, no truncation) are stored, with a TTL scaled by how long the
//! search took.

use std::sync::Arc;
use std::time::Instant;

use kairos_batch::{BatchOptimizer, SlotOutcome};
use kairos_cache::{CacheKey, CacheScope, CacheStats, Clock, SystemClock, TieredCache};
use kairos_config::Settings;
use kairos_core::{Body, Deadline, EclipseKind, EclipseSubtype, GeoLocation, PositionProvider};
use kairos_search::{
    EclipseFilter, EclipseSearch, EventSearch, IngressSearch, SearchError, Sign, StationSearch,
    TransitSearch,
};
use kairos_validate::{
    AccuracyMetrics, ObservedEvent, ReferenceCatalogue, ValidationResult, Validator,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::components::Components;
use crate::error::EngineError;
use crate::request::{BatchRequest, BatchResponse};

/// Shared state every locator call reads. Held behind an `Arc` so batch
/// workers can own a handle without owning the worker pool.
struct Locators {
    provider: Arc<dyn PositionProvider>,
    cache: Arc<TieredCache>,
    settings: Settings,
    components: Components,
}

#[derive(Clone)]
pub struct EventEngine {
    locators: Arc<Locators>,
    batch: BatchOptimizer,
    validator: Option<Arc<Validator>>,
}

impl std::fmt::Debug for EventEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEngine")
            .field("settings", &self.locators.settings)
            .field("batch", &self.batch)
            .field("has_catalogue", &self.validator.is_some())
            .finish()
    }
}

impl EventEngine {
    /// Build an engine on the system clock.
    pub fn new(
        provider: Arc<dyn PositionProvider>,
        settings: Settings,
    ) -> Result<Self, EngineError> {
        Self::with_clock(provider, settings, Arc::new(SystemClock))
    }

    /// Build an engine whose cache expiry follows `clock`.
    pub fn with_clock(
        provider: Arc<dyn PositionProvider>,
        settings: Settings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        let components = Components::from_settings(&settings);
        let cache = match &settings.cache.persistent_dir {
            Some(dir) => TieredCache::with_directory(&components.cache, clock, dir.clone())?,
            None => TieredCache::new(&components.cache, clock)?,
        };
        let batch = BatchOptimizer::new(components.batch)?;
        debug!(
            workers = batch.workers(),
            persistent = settings.cache.persistent_dir.is_some(),
            "event engine ready"
        );
        Ok(Self {
            locators: Arc::new(Locators {
                provider,
                cache: Arc::new(cache),
                settings,
                components,
            }),
            batch,
            validator: None,
        })
    }

    /// Attach a reference catalogue for [`validate`](Self::validate).
    pub fn with_catalogue(mut self, catalogue: ReferenceCatalogue) -> Result<Self, EngineError> {
        let validator = Validator::new(Arc::new(catalogue), self.locators.components.validator)?;
        self.validator = Some(Arc::new(validator));
        Ok(self)
    }

    pub fn settings(&self) -> &Settings {
        &self.locators.settings
    }

    // -----------------------------------------------------------------------
    // Locators
    // -----------------------------------------------------------------------

    /// Next `max_crossings` times `body` reaches `target_deg` after `jd_start`.
    pub fn find_next_transit(
        &self,
        body: Body,
        target_deg: f64,
        jd_start: f64,
        max_crossings: usize,
    ) -> Result<TransitSearch, EngineError> {
        self.locators.next_transit(body, target_deg, jd_start, max_crossings, &Deadline::none())
    }

    /// Every crossing of `target_deg` in `[jd_start, jd_end]`.
    pub fn search_transits(
        &self,
        body: Body,
        target_deg: f64,
        jd_start: f64,
        jd_end: f64,
    ) -> Result<TransitSearch, EngineError> {
        let l = &self.locators;
        l.cached(
            "search_transits",
            &(body, target_deg, jd_start, jd_end),
            || {
                kairos_search::search_transits(
                    l.provider.as_ref(),
                    body,
                    target_deg,
                    jd_start,
                    jd_end,
                    &l.components.transit,
                    &Deadline::none(),
                )
            },
        )
    }

    /// Next sign ingress of `body`, or the next ingress into `target_sign`.
    pub fn find_sign_ingress(
        &self,
        body: Body,
        jd_start: f64,
        target_sign: Option<Sign>,
    ) -> Result<IngressSearch, EngineError> {
        self.locators.sign_ingress(body, jd_start, target_sign, &Deadline::none())
    }

    /// Every sign ingress in `[jd_start, jd_end]`.
    pub fn search_sign_ingresses(
        &self,
        body: Body,
        jd_start: f64,
        jd_end: f64,
    ) -> Result<IngressSearch, EngineError> {
        let l = &self.locators;
        l.cached("search_sign_ingresses", &(body, jd_start, jd_end), || {
            kairos_search::search_sign_ingresses(
                l.provider.as_ref(),
                body,
                jd_start,
                jd_end,
                &l.components.transit,
                &Deadline::none(),
            )
        })
    }

    /// Next station (retrograde or direct) of `body`.
    pub fn next_station(&self, body: Body, jd_start: f64) -> Result<StationSearch, EngineError> {
        self.locators.next_station(body, jd_start, &Deadline::none())
    }

    /// Every station in `[jd_start, jd_end]`.
    pub fn search_stations(
        &self,
        body: Body,
        jd_start: f64,
        jd_end: f64,
    ) -> Result<StationSearch, EngineError> {
        let l = &self.locators;
        l.cached("search_stations", &(body, jd_start, jd_end), || {
            kairos_search::search_stations(
                l.provider.as_ref(),
                body,
                jd_start,
                jd_end,
                &l.components.station,
                &Deadline::none(),
            )
        })
    }

    /// Next eclipse of `kind`, optionally of one subtype and/or visible from
    /// `location`.
    pub fn find_next_eclipse(
        &self,
        kind: EclipseKind,
        jd_start: f64,
        subtype: Option<EclipseSubtype>,
        location: Option<GeoLocation>,
    ) -> Result<EclipseSearch, EngineError> {
        let filter = EclipseFilter { subtype, location };
        self.locators.next_eclipse(kind, jd_start, filter, &Deadline::none())
    }

    /// Most recent eclipse of `kind` before `jd_start`.
    pub fn find_previous_eclipse(
        &self,
        kind: EclipseKind,
        jd_start: f64,
        subtype: Option<EclipseSubtype>,
        location: Option<GeoLocation>,
    ) -> Result<EclipseSearch, EngineError> {
        let l = &self.locators;
        let filter = EclipseFilter { subtype, location };
        l.cached("find_previous_eclipse", &(kind, jd_start, &filter), || {
            kairos_search::find_previous_eclipse(
                l.provider.as_ref(),
                kind,
                jd_start,
                &filter,
                &l.components.eclipse,
                &Deadline::none(),
            )
        })
    }

    /// Every eclipse in `[jd_start, jd_end]`, optionally of one kind.
    pub fn search_eclipses_in_range(
        &self,
        jd_start: f64,
        jd_end: f64,
        kind_filter: Option<EclipseKind>,
    ) -> Result<EclipseSearch, EngineError> {
        self.locators
            .eclipses_in_range(jd_start, jd_end, kind_filter, &Deadline::none())
    }

    // -----------------------------------------------------------------------
    // Batch
    // -----------------------------------------------------------------------

    /// Run many locator calls on the worker pool. Outcomes are index-aligned
    /// with `requests`; one failing or slow request fails only its own slot.
    pub fn run_batch(&self, requests: Vec<BatchRequest>) -> Vec<SlotOutcome<BatchResponse>> {
        let locators = Arc::clone(&self.locators);
        self.batch
            .run_batch(requests, move |request, deadline| locators.execute(&request, deadline))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check a computed event against the attached reference catalogue and
    /// record the result for [`accuracy_report`](Self::accuracy_report).
    pub fn validate<E: Into<ObservedEvent>>(
        &self,
        event: E,
    ) -> Result<ValidationResult, EngineError> {
        let validator = self.validator.as_ref().ok_or(EngineError::NoCatalogue)?;
        Ok(validator.validate(&event.into()))
    }

    /// Aggregate metrics over the recent validation history.
    pub fn accuracy_report(&self) -> Result<AccuracyMetrics, EngineError> {
        let validator = self.validator.as_ref().ok_or(EngineError::NoCatalogue)?;
        Ok(validator.report())
    }

    // -----------------------------------------------------------------------
    // Cache
    // -----------------------------------------------------------------------

    pub fn cache_stats(&self) -> CacheStats {
        self.locators.cache.stats()
    }

    /// Clear the cache; `None` clears every tier.
    pub fn clear_cache(&self, scope: Option<CacheScope>) -> usize {
        self.locators.cache.clear(&scope.unwrap_or_default())
    }
}

impl Locators {
    /// Serve from the cache, or compute and store a complete result.
    fn cached<E, A, F>(
        &self,
        op: &'static str,
        args: &A,
        compute: F,
    ) -> Result<EventSearch<E>, EngineError>
    where
        E: Serialize + DeserializeOwned,
        A: Serialize + ?Sized,
        F: FnOnce() -> Result<EventSearch<E>, SearchError>,
    {
        let key = CacheKey::new(op, &(args, &self.settings.search, &self.settings.eclipse))?;
        if let Some(bytes) = self.cache.get(&key) {
            match serde_json::from_slice(&bytes) {
                Ok(hit) => return Ok(hit),
                Err(e) => warn!(%key, error = %e, "undecodable cache entry dropped"),
            }
            self.cache.remove(&key);
        }

        let started = Instant::now();
        let result = compute()?;
        let cost = started.elapsed();
        if result.is_complete() {
            let bytes = serde_json::to_vec(&result)?;
            self.cache.put_with_cost(key, Arc::from(bytes), cost);
        }
        debug!(
            op,
            events = result.events.len(),
            complete = result.is_complete(),
            cost_us = cost.as_micros() as u64,
            "locator call"
        );
        Ok(result)
    }

    fn next_transit(
        &self,
        body: Body,
        target_deg: f64,
        jd_start: f64,
        max_crossings: usize,
        deadline: &Deadline,
    ) -> Result<TransitSearch, EngineError> {
        self.cached(
            "find_next_transit",
            &(body, target_deg, jd_start, max_crossings),
            || {
                kairos_search::find_next_transit(
                    self.provider.as_ref(),
                    body,
                    target_deg,
                    jd_start,
                    max_crossings,
                    &self.components.transit,
                    deadline,
                )
            },
        )
    }

    fn sign_ingress(
        &self,
        body: Body,
        jd_start: f64,
        target_sign: Option<Sign>,
        deadline: &Deadline,
    ) -> Result<IngressSearch, EngineError> {
        self.cached("find_sign_ingress", &(body, jd_start, target_sign), || {
            kairos_search::find_sign_ingress(
                self.provider.as_ref(),
                body,
                jd_start,
                target_sign,
                &self.components.transit,
                deadline,
            )
        })
    }

    fn next_station(
        &self,
        body: Body,
        jd_start: f64,
        deadline: &Deadline,
    ) -> Result<StationSearch, EngineError> {
        self.cached("next_station", &(body, jd_start), || {
            kairos_search::next_station(
                self.provider.as_ref(),
                body,
                jd_start,
                &self.components.station,
                deadline,
            )
        })
    }

    fn next_eclipse(
        &self,
        kind: EclipseKind,
        jd_start: f64,
        filter: EclipseFilter,
        deadline: &Deadline,
    ) -> Result<EclipseSearch, EngineError> {
        self.cached("find_next_eclipse", &(kind, jd_start, &filter), || {
            kairos_search::find_next_eclipse(
                self.provider.as_ref(),
                kind,
                jd_start,
                &filter,
                &self.components.eclipse,
                deadline,
            )
        })
    }

    fn eclipses_in_range(
        &self,
        jd_start: f64,
        jd_end: f64,
        kind_filter: Option<EclipseKind>,
        deadline: &Deadline,
    ) -> Result<EclipseSearch, EngineError> {
        self.cached(
            "search_eclipses_in_range",
            &(jd_start, jd_end, kind_filter),
            || {
                kairos_search::search_eclipses_in_range(
                    self.provider.as_ref(),
                    jd_start,
                    jd_end,
                    kind_filter,
                    &self.components.eclipse,
                    deadline,
                )
            },
        )
    }

    fn execute(
        &self,
        request: &BatchRequest,
        deadline: &Deadline,
    ) -> Result<BatchResponse, EngineError> {
        debug!(?request, body = ?request.body(), "batch slot started");
        Ok(match *request {
            BatchRequest::NextTransit {
                body,
                target_deg,
                jd_start,
                max_crossings,
            } => BatchResponse::Transits(self.next_transit(
                body,
                target_deg,
                jd_start,
                max_crossings,
                deadline,
            )?),
            BatchRequest::SignIngress {
                body,
                jd_start,
                target_sign,
            } => {
                BatchResponse::Ingresses(self.sign_ingress(body, jd_start, target_sign, deadline)?)
            }
            BatchRequest::NextStation { body, jd_start } => {
                BatchResponse::Stations(self.next_station(body, jd_start, deadline)?)
            }
            BatchRequest::NextEclipse {
                kind,
                jd_start,
                subtype,
                location,
            } => BatchResponse::Eclipses(self.next_eclipse(
                kind,
                jd_start,
                EclipseFilter { subtype, location },
                deadline,
            )?),
            BatchRequest::EclipsesInRange {
                jd_start,
                jd_end,
                kind,
            } => {
                BatchResponse::Eclipses(self.eclipses_in_range(jd_start, jd_end, kind, deadline)?)
            }
        })
    }
}
