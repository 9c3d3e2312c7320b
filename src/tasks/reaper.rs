//! Expiry Reaper Task
//!
//! Background task that periodically removes expired cache entries from
//! both tiers. Reads already skip expired entries; this only reclaims space
//! held by keys nobody touches.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Default interval between sweeps.
pub const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Spawns a background task that periodically purges expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// sweeps. It takes the store's write lock only for the sweep itself.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = shared(CacheStore::memory_only());
/// let reaper = spawn_expiry_reaper(cache.clone(), DEFAULT_REAPER_INTERVAL);
/// // Later, during shutdown:
/// reaper.abort();
/// ```
pub fn spawn_expiry_reaper(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache expiry reaper with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.purge_expired();

            if removed > 0 {
                info!("Cache reaper: removed {} expired entries", removed);
            } else {
                debug!("Cache reaper: no expired entries found");
            }
        }
    })
}
