//! The layered cache: two bounded memory tiers and an optional persistent
//! tier behind a timeout guard.
//!
//! `get` checks tier 1, then 2, then 3 and copies a hit into every faster
//! tier. `put` writes through to all enabled tiers. Nothing is atomic across
//! tiers; values are pure functions of their key, so a racing recompute or a
//! last-writer-wins overwrite stores the same bytes.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::entry::{CacheEntry, CacheValue, TtlPolicy};
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::memory::{MemoryTier, TierLimits, TierStats};
use crate::persistent::{DirectoryBackend, PersistentBackend, TimeoutBackend};

/// Tier number of the persistent tier.
pub const PERSISTENT_TIER: u8 = 3;

/// Construction parameters for a [`TieredCache`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredCacheConfig {
    /// Fast small tier; `None` disables it.
    pub tier1: Option<TierLimits>,
    /// Larger tier; `None` disables it.
    pub tier2: Option<TierLimits>,
    /// Limit for every persistent-tier call.
    pub persistent_timeout: Duration,
    pub ttl: TtlPolicy,
}

impl Default for TieredCacheConfig {
    fn default() -> Self {
        Self {
            tier1: Some(TierLimits {
                capacity: 256,
                max_bytes: 1024 * 1024,
            }),
            tier2: Some(TierLimits {
                capacity: 8_192,
                max_bytes: 32 * 1024 * 1024,
            }),
            persistent_timeout: Duration::from_millis(250),
            ttl: TtlPolicy::default(),
        }
    }
}

impl TieredCacheConfig {
    fn validate(&self) -> Result<(), &'static str> {
        for limits in [&self.tier1, &self.tier2].into_iter().flatten() {
            limits.validate()?;
        }
        if self.persistent_timeout.is_zero() {
            return Err("persistent_timeout must be > 0");
        }
        self.ttl.validate()
    }
}

/// What [`TieredCache::clear`] removes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "scope", content = "value", rename_all = "snake_case")]
pub enum CacheScope {
    #[default]
    All,
    /// One tier by number (1, 2, or 3 for persistent).
    Tier(u8),
    /// Every entry produced by one operation, in all tiers.
    Operation(String),
}

/// Counters for one enabled tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierReport {
    pub tier: u8,
    pub name: &'static str,
    pub stats: TierStats,
}

/// Snapshot of every enabled tier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub tiers: Vec<TierReport>,
    /// Lookups answered by any tier.
    pub hits: u64,
    /// Lookups no tier could answer.
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn tier(&self, tier: u8) -> Option<&TierStats> {
        self.tiers.iter().find(|r| r.tier == tier).map(|r| &r.stats)
    }
}

struct PersistentTier {
    backend: TimeoutBackend,
    stats: Mutex<TierStats>,
}

impl PersistentTier {
    fn record_error(&self, op: &'static str, err: &CacheError) {
        warn!(op, error = %err, "persistent cache tier skipped");
        self.stats.lock().errors += 1;
    }
}

#[derive(Default)]
struct Totals {
    hits: u64,
    misses: u64,
}

pub struct TieredCache {
    clock: Arc<dyn Clock>,
    memory: [Option<MemoryTier>; 2],
    persistent: Option<PersistentTier>,
    ttl: TtlPolicy,
    totals: Mutex<Totals>,
}

impl TieredCache {
    /// Memory tiers only.
    pub fn new(config: &TieredCacheConfig, clock: Arc<dyn Clock>) -> Result<Self, CacheError> {
        config.validate().map_err(CacheError::InvalidConfig)?;
        Ok(Self {
            clock,
            memory: [
                config.tier1.map(|l| MemoryTier::new("tier1", l)),
                config.tier2.map(|l| MemoryTier::new("tier2", l)),
            ],
            persistent: None,
            ttl: config.ttl,
            totals: Mutex::new(Totals::default()),
        })
    }

    /// Memory tiers plus a persistent tier on `backend`.
    pub fn with_backend(
        config: &TieredCacheConfig,
        clock: Arc<dyn Clock>,
        backend: Arc<dyn PersistentBackend>,
    ) -> Result<Self, CacheError> {
        let mut cache = Self::new(config, clock)?;
        cache.persistent = Some(PersistentTier {
            backend: TimeoutBackend::new(backend, config.persistent_timeout)?,
            stats: Mutex::new(TierStats::default()),
        });
        Ok(cache)
    }

    /// Memory tiers plus a directory-backed persistent tier.
    pub fn with_directory(
        config: &TieredCacheConfig,
        clock: Arc<dyn Clock>,
        dir: impl Into<std::path::PathBuf>,
    ) -> Result<Self, CacheError> {
        let backend = DirectoryBackend::open(dir)?;
        Self::with_backend(config, clock, Arc::new(backend))
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    fn memory_tiers(&self) -> impl Iterator<Item = (u8, &MemoryTier)> {
        self.memory
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_ref().map(|t| (i as u8 + 1, t)))
    }

    /// Copy a hit into every tier faster than `found_in`.
    fn promote(&self, entry: &CacheEntry, found_in: u8, now: Duration) {
        for (n, tier) in self.memory_tiers() {
            if n < found_in {
                tier.put(entry.promoted(now));
            }
        }
    }

    fn record(&self, hit: bool) {
        let mut t = self.totals.lock();
        if hit {
            t.hits += 1;
        } else {
            t.misses += 1;
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        let now = self.clock.now();

        for (n, tier) in self.memory_tiers() {
            if let Some(entry) = tier.get(key, now) {
                self.promote(&entry, n, now);
                self.record(true);
                debug!(%key, tier = n, "cache hit");
                return Some(entry.value);
            }
        }

        if let Some(p) = &self.persistent {
            match p.backend.load(key) {
                Ok(Some(entry)) if entry.is_expired(now) => {
                    {
                        let mut s = p.stats.lock();
                        s.expirations += 1;
                        s.misses += 1;
                    }
                    if let Err(e) = p.backend.remove(key) {
                        p.record_error("remove", &e);
                    }
                }
                Ok(Some(entry)) => {
                    p.stats.lock().hits += 1;
                    self.promote(&entry, PERSISTENT_TIER, now);
                    self.record(true);
                    debug!(%key, tier = PERSISTENT_TIER, "cache hit");
                    return Some(entry.value);
                }
                Ok(None) => p.stats.lock().misses += 1,
                Err(e) => p.record_error("load", &e),
            }
        }

        self.record(false);
        debug!(%key, "cache miss");
        None
    }

    /// Store `value` in every enabled tier. `ttl = None` means no time-based
    /// expiry.
    pub fn put(&self, key: CacheKey, value: CacheValue, ttl: Option<Duration>) {
        let entry = CacheEntry::new(key, value, ttl, self.clock.now());
        if let Some(p) = &self.persistent
            && let Err(e) = p.backend.store(&entry)
        {
            p.record_error("store", &e);
        }
        for (_, tier) in self.memory_tiers() {
            tier.put(entry.clone());
        }
    }

    /// Store with a TTL derived from how long the value took to compute.
    pub fn put_with_cost(&self, key: CacheKey, value: CacheValue, cost: Duration) {
        let ttl = self.ttl.ttl_for(cost);
        self.put(key, value, Some(ttl));
    }

    pub fn remove(&self, key: &CacheKey) {
        for (_, tier) in self.memory_tiers() {
            tier.remove(key);
        }
        if let Some(p) = &self.persistent
            && let Err(e) = p.backend.remove(key)
        {
            p.record_error("remove", &e);
        }
    }

    /// Drop expired entries from the memory tiers. Returns the count.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.memory_tiers().map(|(_, t)| t.purge_expired(now)).sum()
    }

    /// Remove entries in `scope`. Returns how many were removed; persistent
    /// failures are logged and count as zero.
    pub fn clear(&self, scope: &CacheScope) -> usize {
        let mut removed = 0;
        for (n, tier) in self.memory_tiers() {
            removed += match scope {
                CacheScope::All => tier.clear(),
                CacheScope::Tier(t) if *t == n => tier.clear(),
                CacheScope::Tier(_) => 0,
                CacheScope::Operation(op) => tier.retain(|k| k.operation() != op.as_str()),
            };
        }
        if let Some(p) = &self.persistent {
            let result = match scope {
                CacheScope::All => p.backend.clear(None),
                CacheScope::Tier(PERSISTENT_TIER) => p.backend.clear(None),
                CacheScope::Tier(_) => Ok(0),
                CacheScope::Operation(op) => p.backend.clear(Some(op.as_str())),
            };
            match result {
                Ok(n) => removed += n,
                Err(e) => p.record_error("clear", &e),
            }
        }
        debug!(?scope, removed, "cache cleared");
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let mut tiers: Vec<TierReport> = self
            .memory_tiers()
            .map(|(n, t)| TierReport {
                tier: n,
                name: t.name(),
                stats: t.stats(),
            })
            .collect();
        if let Some(p) = &self.persistent {
            let mut stats = *p.stats.lock();
            match p.backend.len() {
                Ok(n) => stats.entries = n,
                Err(e) => p.record_error("len", &e),
            }
            tiers.push(TierReport {
                tier: PERSISTENT_TIER,
                name: "persistent",
                stats,
            });
        }
        let totals = self.totals.lock();
        CacheStats {
            tiers,
            hits: totals.hits,
            misses: totals.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::ManualClock;

    use super::*;

    fn key(n: u32) -> CacheKey {
        CacheKey::new("op", &n).unwrap()
    }

    fn value(s: &str) -> CacheValue {
        Arc::from(s.as_bytes())
    }

    #[test]
    fn put_then_get() {
        let cache =
            TieredCache::new(&TieredCacheConfig::default(), Arc::new(ManualClock::default()))
                .unwrap();
        cache.put(key(1), value("a"), None);
        assert_eq!(cache.get(&key(1)).as_deref(), Some(&b"a"[..]));
        assert!(cache.get(&key(2)).is_none());
        let s = cache.stats();
        assert_eq!((s.hits, s.misses), (1, 1));
    }

    #[test]
    fn tier2_hit_promotes_to_tier1() {
        let cache =
            TieredCache::new(&TieredCacheConfig::default(), Arc::new(ManualClock::default()))
                .unwrap();
        cache.put(key(1), value("a"), None);
        cache.clear(&CacheScope::Tier(1));
        assert!(cache.get(&key(1)).is_some());
        let s = cache.stats();
        assert_eq!(s.tier(2).unwrap().hits, 1);
        assert_eq!(s.tier(1).unwrap().entries, 1);
        assert!(cache.get(&key(1)).is_some());
        assert_eq!(cache.stats().tier(1).unwrap().hits, 1);
    }

    #[test]
    fn disabled_tier_is_absent() {
        let config = TieredCacheConfig {
            tier1: None,
            ..Default::default()
        };
        let cache = TieredCache::new(&config, Arc::new(ManualClock::default())).unwrap();
        cache.put(key(1), value("a"), None);
        assert!(cache.get(&key(1)).is_some());
        assert!(cache.stats().tier(1).is_none());
    }

    #[test]
    fn rejects_zero_capacity() {
        let config = TieredCacheConfig {
            tier1: Some(TierLimits {
                capacity: 0,
                max_bytes: 10,
            }),
            ..Default::default()
        };
        assert!(matches!(
            TieredCache::new(&config, Arc::new(ManualClock::default())),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn clear_by_operation() {
        let cache =
            TieredCache::new(&TieredCacheConfig::default(), Arc::new(ManualClock::default()))
                .unwrap();
        cache.put(CacheKey::new("transit", &1).unwrap(), value("t"), None);
        cache.put(CacheKey::new("eclipse", &1).unwrap(), value("e"), None);
        // One entry in each of two memory tiers.
        assert_eq!(cache.clear(&CacheScope::Operation("transit".into())), 2);
        assert!(cache.get(&CacheKey::new("eclipse", &1).unwrap()).is_some());
    }
}
