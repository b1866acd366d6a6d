//! Cache entries and the adaptive TTL policy.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::key::CacheKey;

/// Cached payload. Values are immutable and shared between tiers.
pub type CacheValue = Arc<[u8]>;

/// Fixed per-entry overhead counted against byte budgets.
const ENTRY_OVERHEAD_BYTES: usize = 64;

/// One cached value plus its bookkeeping. Owned by exactly one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: CacheValue,
    /// Clock time when the value was first computed.
    pub created_at: Duration,
    /// `None` means no time-based expiry (LRU still applies).
    pub ttl: Option<Duration>,
    pub access_count: u64,
    pub last_accessed: Duration,
}

impl CacheEntry {
    pub fn new(key: CacheKey, value: CacheValue, ttl: Option<Duration>, now: Duration) -> Self {
        Self {
            key,
            value,
            created_at: now,
            ttl,
            access_count: 0,
            last_accessed: now,
        }
    }

    /// An entry with `ttl = t` is live strictly before `created_at + t`.
    pub fn is_expired(&self, now: Duration) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_sub(self.created_at) >= ttl)
    }

    /// Copy for another tier: same value and expiry, fresh access stats.
    pub(crate) fn promoted(&self, now: Duration) -> Self {
        Self {
            key: self.key.clone(),
            value: Arc::clone(&self.value),
            created_at: self.created_at,
            ttl: self.ttl,
            access_count: 0,
            last_accessed: now,
        }
    }

    pub(crate) fn size_bytes(&self) -> usize {
        self.value.len() + self.key.size_bytes() + ENTRY_OVERHEAD_BYTES
    }
}

/// Stored TTL grows with the cost of producing the value:
/// `base * min(1 + cost / cost_reference, max_multiplier)`.
///
/// Cheap results expire quickly; expensive ones stay long enough to pay
/// for themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TtlPolicy {
    pub base: Duration,
    pub cost_reference: Duration,
    pub max_multiplier: f64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(300),
            cost_reference: Duration::from_millis(10),
            max_multiplier: 48.0,
        }
    }
}

impl TtlPolicy {
    pub fn ttl_for(&self, cost: Duration) -> Duration {
        let ratio = cost.as_secs_f64() / self.cost_reference.as_secs_f64();
        self.base.mul_f64((1.0 + ratio).min(self.max_multiplier))
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.base.is_zero() || self.cost_reference.is_zero() {
            return Err("ttl base and cost_reference must be > 0");
        }
        if !self.max_multiplier.is_finite() || self.max_multiplier < 1.0 {
            return Err("ttl max_multiplier must be >= 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ttl: Option<Duration>) -> CacheEntry {
        let key = CacheKey::new("op", &1).unwrap();
        CacheEntry::new(key, Arc::from(&b"v"[..]), ttl, Duration::from_secs(100))
    }

    #[test]
    fn expiry_boundary() {
        let e = entry(Some(Duration::from_secs(10)));
        assert!(!e.is_expired(Duration::from_millis(109_999)));
        assert!(e.is_expired(Duration::from_secs(110)));
    }

    #[test]
    fn no_ttl_never_expires() {
        assert!(!entry(None).is_expired(Duration::MAX));
    }

    #[test]
    fn ttl_scales_with_cost_and_caps() {
        let p = TtlPolicy::default();
        assert_eq!(p.ttl_for(Duration::ZERO), Duration::from_secs(300));
        assert_eq!(p.ttl_for(Duration::from_millis(10)), Duration::from_secs(600));
        assert_eq!(p.ttl_for(Duration::from_secs(60)), Duration::from_secs(300 * 48));
    }
}
