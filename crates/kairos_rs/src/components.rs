//! Mapping [`Settings`] sections onto each component's own config type.

use std::time::Duration;

use kairos_batch::BatchConfig;
use kairos_cache::{TierLimits, TieredCacheConfig, TtlPolicy};
use kairos_config::{MemoryTierSettings, Settings};
use kairos_search::{EclipseConfig, ScanConfig, StationConfig, TransitConfig};
use kairos_validate::ValidatorConfig;

const DAYS_PER_YEAR: f64 = 365.25;

/// Every component config, derived once from one [`Settings`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Components {
    pub transit: TransitConfig,
    pub station: StationConfig,
    pub eclipse: EclipseConfig,
    pub cache: TieredCacheConfig,
    pub batch: BatchConfig,
    pub validator: ValidatorConfig,
}

impl Components {
    pub fn from_settings(s: &Settings) -> Self {
        let scan = ScanConfig {
            max_consecutive_faults: s.search.max_consecutive_faults,
            vectorize: s.search.vectorize,
            vector_chunk: s.search.vector_chunk,
        };
        Self {
            transit: TransitConfig {
                precision_deg: s.search.precision_deg,
                max_iterations: s.search.max_iterations,
                orb_deg: s.search.orb_deg,
                compute_orb_durations: s.search.compute_orb_durations,
                scan,
            },
            station: StationConfig {
                precision: s.search.station_precision,
                max_iterations: s.search.max_iterations,
                scan,
            },
            eclipse: EclipseConfig {
                max_range_days: s.eclipse.max_range_years * DAYS_PER_YEAR,
                scan_horizon_days: s.eclipse.scan_horizon_years * DAYS_PER_YEAR,
                refine: s.eclipse.refine,
                refine_window_days: s.eclipse.refine_window_days,
                refine_precision: s.eclipse.refine_precision,
                max_iterations: s.search.max_iterations,
            },
            cache: TieredCacheConfig {
                tier1: tier_limits(&s.cache.tier1),
                tier2: tier_limits(&s.cache.tier2),
                persistent_timeout: Duration::from_millis(s.cache.persistent_timeout_ms),
                ttl: TtlPolicy {
                    base: Duration::from_secs(s.cache.ttl.base_ttl_secs),
                    cost_reference: Duration::from_millis(s.cache.ttl.cost_reference_ms),
                    max_multiplier: s.cache.ttl.max_ttl_multiplier,
                },
            },
            batch: BatchConfig {
                workers: s.batch.workers,
                slot_timeout: Duration::from_millis(s.batch.slot_timeout_ms),
                batch_timeout: s.batch.batch_timeout_ms.map(Duration::from_millis),
            },
            validator: ValidatorConfig {
                window_days: s.validation.window_days,
                transit_tolerance_s: s.validation.timing.transit_s,
                ingress_tolerance_s: s.validation.timing.ingress_s,
                station_tolerance_s: s.validation.timing.station_s,
                eclipse_tolerance_s: s.validation.timing.eclipse_s,
                position_tolerance_deg: s.validation.position_tolerance_deg,
                magnitude_tolerance: s.validation.magnitude_tolerance,
                history_window: s.validation.history_window,
            },
        }
    }
}

fn tier_limits(t: &MemoryTierSettings) -> Option<TierLimits> {
    t.enabled.then_some(TierLimits {
        capacity: t.capacity,
        max_bytes: t.max_bytes,
    })
}
