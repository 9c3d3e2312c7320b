//! Invalidation Bus
//!
//! Write-invalidate entry points used after successful mutations and on
//! identity changes.

use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::models::Category;

/// Drops cache entries whose data a write has made stale.
#[derive(Debug, Clone)]
pub struct InvalidationBus {
    cache: SharedCache,
}

impl InvalidationBus {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }

    /// Clears `category` and every category derived from it.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate(&self, category: Category) -> usize {
        let mut cache = self.cache.write().await;
        let mut removed = cache.clear_category(category);
        for dependent in category.dependents() {
            removed += cache.clear_category(*dependent);
        }
        debug!(
            category = %category,
            dependents = ?category.dependents(),
            removed,
            "Cache invalidated"
        );
        removed
    }

    /// Clears every entry whose key contains `needle`.
    pub async fn invalidate_matching(&self, needle: &str) -> usize {
        let removed = self.cache.write().await.clear_matching(needle);
        debug!(needle, removed, "Cache invalidated by key match");
        removed
    }

    /// Clears the whole cache. Used whenever the authenticated identity changes.
    pub async fn invalidate_all(&self) -> usize {
        let removed = self.cache.write().await.clear_matching("");
        info!(removed, "Cache cleared");
        removed
    }
}
