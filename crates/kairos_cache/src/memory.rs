//! Bounded in-memory tier with LRU eviction.
//!
//! Entries live in a hash map; recency is a monotonically increasing tick
//! per access, indexed by a `BTreeMap<tick, key>` so the least recently used
//! entry is always the first key. One mutex guards both maps; a get/put holds
//! it only for map operations.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::entry::CacheEntry;
use crate::key::CacheKey;

/// Capacity bounds of one memory tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// Maximum number of entries.
    pub capacity: usize,
    /// Maximum total entry bytes.
    pub max_bytes: usize,
}

impl TierLimits {
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.capacity == 0 || self.max_bytes == 0 {
            return Err("tier capacity and max_bytes must be > 0");
        }
        Ok(())
    }
}

/// Counters for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Backend failures and timeouts (persistent tier only).
    pub errors: u64,
    pub entries: usize,
    pub bytes: usize,
}

impl TierStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Slot {
    entry: CacheEntry,
    tick: u64,
}

#[derive(Default)]
struct TierState {
    entries: HashMap<CacheKey, Slot>,
    recency: BTreeMap<u64, CacheKey>,
    next_tick: u64,
    bytes: usize,
    stats: TierStats,
}

impl TierState {
    fn bump(&mut self) -> u64 {
        let t = self.next_tick;
        self.next_tick += 1;
        t
    }

    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let slot = self.entries.remove(key)?;
        self.recency.remove(&slot.tick);
        self.bytes -= slot.entry.size_bytes();
        Some(slot.entry)
    }

    fn evict_lru(&mut self) -> bool {
        let Some((_, key)) = self.recency.pop_first() else {
            return false;
        };
        if let Some(slot) = self.entries.remove(&key) {
            self.bytes -= slot.entry.size_bytes();
            self.stats.evictions += 1;
        }
        true
    }
}

pub struct MemoryTier {
    name: &'static str,
    limits: TierLimits,
    state: Mutex<TierState>,
}

impl MemoryTier {
    pub fn new(name: &'static str, limits: TierLimits) -> Self {
        Self {
            name,
            limits,
            state: Mutex::new(TierState::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a live entry and record the access. Expired entries are
    /// dropped and count as a miss.
    pub fn get(&self, key: &CacheKey, now: Duration) -> Option<CacheEntry> {
        let mut st = self.state.lock();
        let expired = match st.entries.get(key) {
            None => {
                st.stats.misses += 1;
                return None;
            }
            Some(slot) => slot.entry.is_expired(now),
        };
        if expired {
            st.remove(key);
            st.stats.expirations += 1;
            st.stats.misses += 1;
            return None;
        }

        let tick = st.bump();
        let slot = st.entries.get_mut(key)?;
        let old_tick = std::mem::replace(&mut slot.tick, tick);
        slot.entry.access_count += 1;
        slot.entry.last_accessed = now;
        let entry = slot.entry.clone();
        st.recency.remove(&old_tick);
        st.recency.insert(tick, key.clone());
        st.stats.hits += 1;
        Some(entry)
    }

    /// Insert or replace an entry, evicting least recently used entries until
    /// the tier is back within bounds. An entry larger than the whole byte
    /// budget is not stored.
    pub fn put(&self, entry: CacheEntry) {
        let size = entry.size_bytes();
        if size > self.limits.max_bytes {
            return;
        }
        let mut st = self.state.lock();
        st.remove(&entry.key);
        while st.entries.len() >= self.limits.capacity
            || st.bytes + size > self.limits.max_bytes
        {
            if !st.evict_lru() {
                break;
            }
        }
        let tick = st.bump();
        st.recency.insert(tick, entry.key.clone());
        st.bytes += size;
        st.entries.insert(entry.key.clone(), Slot { entry, tick });
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.state.lock().remove(key).is_some()
    }

    /// Drop every entry for which `keep` returns false. Returns the count.
    pub fn retain<F: FnMut(&CacheKey) -> bool>(&self, mut keep: F) -> usize {
        let mut st = self.state.lock();
        let doomed: Vec<CacheKey> = st.entries.keys().filter(|k| !keep(*k)).cloned().collect();
        for key in &doomed {
            st.remove(key);
        }
        doomed.len()
    }

    pub fn clear(&self) -> usize {
        self.retain(|_| false)
    }

    /// Drop all expired entries. Returns the count.
    pub fn purge_expired(&self, now: Duration) -> usize {
        let mut st = self.state.lock();
        let doomed: Vec<CacheKey> = st
            .entries
            .values()
            .filter(|s| s.entry.is_expired(now))
            .map(|s| s.entry.key.clone())
            .collect();
        for key in &doomed {
            st.remove(key);
        }
        st.stats.expirations += doomed.len() as u64;
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> TierStats {
        let st = self.state.lock();
        TierStats {
            entries: st.entries.len(),
            bytes: st.bytes,
            ..st.stats
        }
    }
}
