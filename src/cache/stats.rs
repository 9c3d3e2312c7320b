//! Cache Statistics Module
//!
//! Tracks cache effectiveness and durable-tier health.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from either tier
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Entries copied from the durable tier into memory
    pub promotions: u64,
    /// Entries removed because their TTL elapsed (lazily or by the reaper)
    pub expirations: u64,
    /// Entries removed by explicit invalidation
    pub invalidations: u64,
    /// Durable-tier operations that failed and were swallowed
    pub durable_failures: u64,
    /// Current number of entries in the memory tier
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Promotion ==
    /// Counts an entry promoted from the durable tier.
    pub fn record_promotion(&mut self) {
        self.promotions += 1;
    }

    // == Record Expirations ==
    /// Adds `count` expired entries.
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    // == Record Invalidations ==
    /// Adds `count` invalidated entries.
    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    // == Record Durable Failure ==
    /// Counts a swallowed durable-tier failure.
    pub fn record_durable_failure(&mut self) {
        self.durable_failures += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
