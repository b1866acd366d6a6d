//! Multi-tier result cache for the kairos event engine.
//!
//! This crate provides:
//! - [`CacheKey`]: a stable BLAKE3 digest over an operation name and its
//!   canonicalized arguments
//! - [`MemoryTier`]: a bounded LRU tier with entry and byte budgets
//! - [`PersistentBackend`] with a directory implementation, always reached
//!   through a [`TimeoutBackend`]
//! - [`TieredCache`]: tier 1 → 2 → 3 lookup with promotion, write-through
//!   puts, adaptive TTL and per-tier stats
//!
//! A failing tier never becomes a caller error: it is logged and skipped.

pub mod clock;
pub mod entry;
pub mod error;
pub mod key;
pub mod memory;
pub mod persistent;
pub mod tiered;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CacheValue, TtlPolicy};
pub use error::CacheError;
pub use key::CacheKey;
pub use memory::{MemoryTier, TierLimits, TierStats};
pub use persistent::{DirectoryBackend, PersistentBackend, TimeoutBackend};
pub use tiered::{
    CacheScope, CacheStats, PERSISTENT_TIER, TierReport, TieredCache, TieredCacheConfig,
};
