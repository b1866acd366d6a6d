//! Per-component settings sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Transit, ingress and station locator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    /// Bisection stops once the bracket spans less than this many degrees.
    pub precision_deg: f64,
    /// Bisection stops once the speed bracket spans less than this (deg/day).
    pub station_precision: f64,
    /// Maximum bisection iterations per bracket.
    pub max_iterations: u32,
    /// Orb used for approach/separation durations.
    pub orb_deg: f64,
    pub compute_orb_durations: bool,
    /// Consecutive failed samples after which the provider is deemed unavailable.
    pub max_consecutive_faults: u32,
    /// Use batched provider sampling when the provider supports it.
    pub vectorize: bool,
    /// Samples requested per batched provider call.
    pub vector_chunk: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            precision_deg: 1e-6,
            station_precision: 1e-7,
            max_iterations: 100,
            orb_deg: 1.0,
            compute_orb_durations: true,
            max_consecutive_faults: 16,
            vectorize: true,
            vector_chunk: 64,
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.precision_deg.is_finite() || self.precision_deg <= 0.0 {
            return Err("search.precision_deg must be positive");
        }
        if !self.station_precision.is_finite() || self.station_precision <= 0.0 {
            return Err("search.station_precision must be positive");
        }
        if self.max_iterations == 0 {
            return Err("search.max_iterations must be > 0");
        }
        if !self.orb_deg.is_finite() || self.orb_deg <= 0.0 || self.orb_deg >= 30.0 {
            return Err("search.orb_deg must be within (0, 30)");
        }
        if self.max_consecutive_faults == 0 {
            return Err("search.max_consecutive_faults must be > 0");
        }
        if self.vector_chunk == 0 {
            return Err("search.vector_chunk must be > 0");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Eclipse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EclipseSettings {
    /// Range searches longer than this are rejected up front.
    pub max_range_years: f64,
    /// Open-ended "next eclipse" searches give up after this span.
    pub scan_horizon_years: f64,
    /// Refine the provider's greatest-eclipse instant with the search core.
    pub refine: bool,
    /// Half-width of the refinement bracket around the provider's estimate.
    pub refine_window_days: f64,
    /// Refinement precision on the separation rate (deg/day).
    pub refine_precision: f64,
}

impl Default for EclipseSettings {
    fn default() -> Self {
        Self {
            max_range_years: 10.0,
            scan_horizon_years: 25.0,
            refine: false,
            refine_window_days: 0.25,
            refine_precision: 1e-4,
        }
    }
}

impl EclipseSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.max_range_years.is_finite() || self.max_range_years <= 0.0 {
            return Err("eclipse.max_range_years must be positive");
        }
        if !self.scan_horizon_years.is_finite() || self.scan_horizon_years <= 0.0 {
            return Err("eclipse.scan_horizon_years must be positive");
        }
        if !self.refine_window_days.is_finite()
            || self.refine_window_days <= 0.0
            || self.refine_window_days > 5.0
        {
            return Err("eclipse.refine_window_days must be within (0, 5]");
        }
        if !self.refine_precision.is_finite() || self.refine_precision <= 0.0 {
            return Err("eclipse.refine_precision must be positive");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Bounds of one in-memory tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryTierSettings {
    pub enabled: bool,
    /// Maximum number of entries.
    pub capacity: usize,
    /// Maximum total value bytes.
    pub max_bytes: usize,
}

impl Default for MemoryTierSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1_024,
            max_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Adaptive TTL: `base * min(1 + cost / cost_reference, max_multiplier)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TtlSettings {
    pub base_ttl_secs: u64,
    pub cost_reference_ms: u64,
    pub max_ttl_multiplier: f64,
}

impl Default for TtlSettings {
    fn default() -> Self {
        Self {
            base_ttl_secs: 300,
            cost_reference_ms: 10,
            max_ttl_multiplier: 48.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    pub tier1: MemoryTierSettings,
    pub tier2: MemoryTierSettings,
    /// Directory for the persistent tier; `None` disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_dir: Option<PathBuf>,
    /// Every persistent-tier call gives up after this long.
    pub persistent_timeout_ms: u64,
    pub ttl: TtlSettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            tier1: MemoryTierSettings {
                enabled: true,
                capacity: 256,
                max_bytes: 1024 * 1024,
            },
            tier2: MemoryTierSettings {
                enabled: true,
                capacity: 8_192,
                max_bytes: 32 * 1024 * 1024,
            },
            persistent_dir: None,
            persistent_timeout_ms: 250,
            ttl: TtlSettings::default(),
        }
    }
}

impl CacheSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        for tier in [&self.tier1, &self.tier2] {
            if tier.enabled && (tier.capacity == 0 || tier.max_bytes == 0) {
                return Err("cache tier capacity and max_bytes must be > 0");
            }
        }
        if self.persistent_timeout_ms == 0 {
            return Err("cache.persistent_timeout_ms must be > 0");
        }
        if self.ttl.base_ttl_secs == 0 {
            return Err("cache.ttl.base_ttl_secs must be > 0");
        }
        if self.ttl.cost_reference_ms == 0 {
            return Err("cache.ttl.cost_reference_ms must be > 0");
        }
        if !self.ttl.max_ttl_multiplier.is_finite() || self.ttl.max_ttl_multiplier < 1.0 {
            return Err("cache.ttl.max_ttl_multiplier must be >= 1");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSettings {
    /// Worker threads; `None` uses the available parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Per-request time limit.
    pub slot_timeout_ms: u64,
    /// Whole-batch time limit; pending slots fail when it passes. Unset, it
    /// is derived from `slot_timeout_ms`, the batch size and the worker count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_timeout_ms: Option<u64>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            workers: None,
            slot_timeout_ms: 5_000,
            batch_timeout_ms: None,
        }
    }
}

impl BatchSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.workers == Some(0) {
            return Err("batch.workers must be > 0");
        }
        if self.slot_timeout_ms == 0 {
            return Err("batch.slot_timeout_ms must be > 0");
        }
        if self.batch_timeout_ms == Some(0) {
            return Err("batch.batch_timeout_ms must be > 0");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Timing tolerances in seconds, per check kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingTolerances {
    pub transit_s: f64,
    pub ingress_s: f64,
    pub station_s: f64,
    pub eclipse_s: f64,
}

impl Default for TimingTolerances {
    fn default() -> Self {
        Self {
            transit_s: 60.0,
            ingress_s: 60.0,
            // Stations are shallow minima of |speed|; their timing is soft.
            station_s: 3_600.0,
            eclipse_s: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSettings {
    /// Reference records further than this from the event are ignored.
    pub window_days: f64,
    pub timing: TimingTolerances,
    pub position_tolerance_deg: f64,
    pub magnitude_tolerance: f64,
    /// Number of recent results kept for metrics.
    pub history_window: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            window_days: 365.25,
            timing: TimingTolerances::default(),
            position_tolerance_deg: 0.01,
            magnitude_tolerance: 0.01,
            history_window: 100,
        }
    }
}

impl ValidationSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.window_days.is_finite() || self.window_days <= 0.0 {
            return Err("validation.window_days must be positive");
        }
        let t = &self.timing;
        for v in [t.transit_s, t.ingress_s, t.station_s, t.eclipse_s] {
            if !v.is_finite() || v < 0.0 {
                return Err("validation timing tolerances must be >= 0");
            }
        }
        if !self.position_tolerance_deg.is_finite() || self.position_tolerance_deg < 0.0 {
            return Err("validation.position_tolerance_deg must be >= 0");
        }
        if !self.magnitude_tolerance.is_finite() || self.magnitude_tolerance < 0.0 {
            return Err("validation.magnitude_tolerance must be >= 0");
        }
        if self.history_window == 0 {
            return Err("validation.history_window must be > 0");
        }
        Ok(())
    }
}
