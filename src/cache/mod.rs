//! Cache Module
//!
//! Dual-tier response caching: deterministic keys, TTL-stamped entries, a
//! memory tier and a best-effort durable tier.

mod clock;
mod durable;
mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use durable::{
    DurableStore, FileDurableStore, MemoryDurableStore, NoDurableStore, DEFAULT_QUOTA_BYTES,
};
pub use entry::CacheEntry;
pub use key::build_key;
pub use stats::CacheStats;
pub use store::{CacheStore, DurableErrorHook};

use std::sync::Arc;
use tokio::sync::RwLock;

// == Public Constants ==
/// Namespace and format version prepended to every cache key.
///
/// Bumping the version orphans every previously persisted entry.
pub const KEY_PREFIX: &str = "buildtrack:v1:";

/// Cache store shared between the client, the invalidation bus and the reaper.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
