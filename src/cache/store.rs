//! Cache Store Module
//!
//! Dual-tier cache engine: a memory map for hot reads backed by a durable
//! store that survives restarts. Durable-tier failures never reach callers.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{
    CacheEntry, CacheStats, Clock, DurableStore, NoDurableStore, SystemClock, KEY_PREFIX,
};
use crate::error::StorageError;
use crate::models::Category;

/// Diagnostic callback invoked for every swallowed durable-tier failure.
pub type DurableErrorHook = Arc<dyn Fn(&StorageError) + Send + Sync>;

// == Cache Store ==
/// Dual-tier response cache with per-entry expiry.
pub struct CacheStore {
    /// Memory tier, authoritative for the current process
    memory: HashMap<String, CacheEntry>,
    /// Durable tier, best-effort
    durable: Box<dyn DurableStore>,
    /// Time source for expiry decisions
    clock: Arc<dyn Clock>,
    /// Performance statistics
    stats: CacheStats,
    /// Optional observer of durable-tier failures
    on_durable_error: Option<DurableErrorHook>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store over `durable`, reading time from `clock`.
    pub fn new(durable: impl DurableStore + 'static, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: HashMap::new(),
            durable: Box::new(durable),
            clock,
            stats: CacheStats::new(),
            on_durable_error: None,
        }
    }

    /// Creates a store with no durable tier, on the wall clock.
    pub fn memory_only() -> Self {
        Self::new(NoDurableStore, Arc::new(SystemClock))
    }

    /// Registers a callback for durable-tier failures.
    pub fn with_durable_error_hook(
        mut self,
        hook: impl Fn(&StorageError) + Send + Sync + 'static,
    ) -> Self {
        self.on_durable_error = Some(Arc::new(hook));
        self
    }

    // == Get ==
    /// Retrieves the live payload stored under `key`.
    ///
    /// A live entry found only in the durable tier is promoted into memory.
    /// An expired entry found in either tier is deleted from both.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now();

        if let Some(entry) = self.memory.get(key) {
            if !entry.is_expired_at(now) {
                let payload = entry.payload.clone();
                let ttl_left = entry.ttl_remaining_at(now).as_secs();
                self.stats.record_hit();
                debug!(key = %key, ttl_left, "Cache hit (memory)");
                return Some(payload);
            }

            self.memory.remove(key);
            self.durable_remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.memory.len());
            debug!(key = %key, "Cache entry expired");
            return None;
        }

        match self.durable_load(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let payload = entry.payload.clone();
                self.memory.insert(key.to_string(), entry);
                self.stats.record_promotion();
                self.stats.record_hit();
                self.stats.set_total_entries(self.memory.len());
                debug!(key = %key, "Cache hit (durable), promoted to memory");
                Some(payload)
            }
            Some(_) => {
                self.durable_remove(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                debug!(key = %key, "Durable cache entry expired");
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores `payload` under `key` for `ttl`.
    ///
    /// The memory write always happens. The durable write is best-effort; if
    /// it fails, any older durable copy of `key` is dropped. A zero TTL stores
    /// nothing and drops any existing entry.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        category: Category,
        payload: Value,
        ttl: Duration,
    ) {
        let key = key.into();
        if ttl.is_zero() {
            debug!(key = %key, "Zero TTL, not caching");
            self.remove(&key);
            return;
        }

        let entry = CacheEntry::new(key.clone(), category, payload, self.clock.now(), ttl);
        self.durable_save(&entry);
        self.memory.insert(key, entry);
        self.stats.set_total_entries(self.memory.len());
    }

    // == Remove ==
    /// Deletes `key` from both tiers.
    pub fn remove(&mut self, key: &str) {
        self.memory.remove(key);
        self.durable_remove(key);
        self.stats.set_total_entries(self.memory.len());
    }

    // == Clear Matching ==
    /// Deletes every entry whose key contains `needle` (case-sensitive).
    ///
    /// An empty needle clears the whole cache namespace. Returns the number
    /// of distinct keys removed.
    pub fn clear_matching(&mut self, needle: &str) -> usize {
        let mut removed: HashSet<String> = HashSet::new();

        self.memory.retain(|key, _| {
            if key.contains(needle) {
                removed.insert(key.clone());
                false
            } else {
                true
            }
        });

        let stale: Vec<String> = self
            .durable_keys()
            .into_iter()
            .filter(|key| key.contains(needle))
            .collect();
        self.durable_remove_many(&stale);
        removed.extend(stale);

        self.finish_invalidation(removed.len())
    }

    // == Clear Category ==
    /// Deletes every entry recorded under `category`.
    ///
    /// Returns the number of distinct keys removed.
    pub fn clear_category(&mut self, category: Category) -> usize {
        let mut removed: HashSet<String> = HashSet::new();

        self.memory.retain(|key, entry| {
            if entry.category == category {
                removed.insert(key.clone());
                false
            } else {
                true
            }
        });

        let mut stale = Vec::new();
        for key in self.durable_keys() {
            let matches = removed.contains(&key)
                || self
                    .durable_load(&key)
                    .is_some_and(|entry| entry.category == category);
            if matches {
                stale.push(key);
            }
        }
        self.durable_remove_many(&stale);
        removed.extend(stale);

        self.finish_invalidation(removed.len())
    }

    // == Purge Expired ==
    /// Removes all expired entries from both tiers.
    ///
    /// Returns the number of distinct keys removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let mut removed: HashSet<String> = HashSet::new();

        self.memory.retain(|key, entry| {
            if entry.is_expired_at(now) {
                removed.insert(key.clone());
                false
            } else {
                true
            }
        });

        let mut stale = Vec::new();
        for key in self.durable_keys() {
            let expired = removed.contains(&key)
                || self
                    .durable_load(&key)
                    .is_some_and(|entry| entry.is_expired_at(now));
            if expired {
                stale.push(key);
            }
        }
        self.durable_remove_many(&stale);
        removed.extend(stale);

        let count = removed.len();
        self.stats.record_expirations(count);
        self.stats.set_total_entries(self.memory.len());
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.memory.len());
        stats
    }

    // == Length ==
    /// Returns the number of entries in the memory tier.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    fn finish_invalidation(&mut self, count: usize) -> usize {
        self.stats.record_invalidations(count);
        self.stats.set_total_entries(self.memory.len());
        count
    }

    // == Durable Tier Boundary ==
    // Every durable call goes through these helpers, which downgrade
    // failures to logged no-ops.

    fn durable_load(&mut self, key: &str) -> Option<CacheEntry> {
        let raw = match self.durable.load(key) {
            Ok(raw) => raw?,
            Err(e) => {
                self.report("load", key, e);
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                self.report(
                    "parse",
                    key,
                    StorageError::Corrupt {
                        key: key.to_string(),
                        reason: e.to_string(),
                    },
                );
                self.durable_remove(key);
                None
            }
        }
    }

    fn durable_save(&mut self, entry: &CacheEntry) {
        let result = serde_json::to_string(entry)
            .map_err(|e| StorageError::Serialize(e.to_string()))
            .and_then(|raw| self.durable.save(&entry.key, &raw));

        if let Err(e) = result {
            self.report("save", &entry.key, e);
            // An older copy must not outlive the memory tier's newer one.
            self.durable_remove(&entry.key);
        }
    }

    fn durable_remove(&mut self, key: &str) {
        if let Err(e) = self.durable.remove(key) {
            self.report("remove", key, e);
        }
    }

    fn durable_remove_many(&mut self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        if let Err(e) = self.durable.remove_many(keys) {
            self.report("remove_many", "*", e);
        }
    }

    /// Durable keys inside the cache namespace; foreign keys are left alone.
    fn durable_keys(&mut self) -> Vec<String> {
        match self.durable.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|key| key.starts_with(KEY_PREFIX))
                .collect(),
            Err(e) => {
                self.report("keys", "*", e);
                Vec::new()
            }
        }
    }

    fn report(&mut self, op: &'static str, key: &str, error: StorageError) {
        warn!(op, key = %key, error = %error, "Durable cache tier failure ignored");
        self.stats.record_durable_failure();
        if let Some(hook) = &self.on_durable_error {
            hook(&error);
        }
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.memory.len())
            .field("durable", &self.durable)
            .field("clock", &self.clock)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{build_key, ManualClock, MemoryDurableStore};
    use crate::error::StorageResult;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MINUTE: Duration = Duration::from_secs(60);

    fn key(endpoint: &str) -> String {
        build_key(endpoint, &BTreeMap::<String, Value>::new())
    }

    fn store_with(durable: &MemoryDurableStore) -> (CacheStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = CacheStore::new(durable.clone(), clock.clone());
        (store, clock)
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::memory_only();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let durable = MemoryDurableStore::new();
        let (mut store, _clock) = store_with(&durable);
        let k = key("/projects");

        store.set(k.clone(), Category::Projects, json!({"projects": [1]}), MINUTE);

        assert_eq!(store.get(&k), Some(json!({"projects": [1]})));
        assert_eq!(store.len(), 1);
        assert!(durable.load(&k).unwrap().is_some());
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::memory_only();
        assert!(store.get(&key("/nothing")).is_none());
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_overwrite() {
        let durable = MemoryDurableStore::new();
        let (mut store, _clock) = store_with(&durable);
        let k = key("/users");

        store.set(k.clone(), Category::Users, json!(1), MINUTE);
        store.set(k.clone(), Category::Users, json!(2), MINUTE);

        assert_eq!(store.get(&k), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_remove() {
        let durable = MemoryDurableStore::new();
        let (mut store, _clock) = store_with(&durable);
        let k = key("/company");

        store.set(k.clone(), Category::Company, json!({}), MINUTE);
        store.remove(&k);
        store.remove(&k);

        assert!(store.is_empty());
        assert!(durable.is_empty());
        assert!(store.get(&k).is_none());
    }

    #[test]
    fn test_store_ttl_expiration_purges_both_tiers() {
        let durable = MemoryDurableStore::new();
        let (mut store, clock) = store_with(&durable);
        let k = key("/revenue");

        store.set(k.clone(), Category::Revenue, json!([]), MINUTE);
        clock.advance(Duration::from_secs(59));
        assert!(store.get(&k).is_some());

        clock.advance(Duration::from_secs(1));
        assert!(store.get(&k).is_none());
        assert!(store.is_empty());
        assert!(durable.is_empty());
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_durable_entry_promoted_after_restart() {
        let durable = MemoryDurableStore::new();
        let clock = Arc::new(ManualClock::starting_now());
        let k = key("/billing");

        let mut first = CacheStore::new(durable.clone(), clock.clone());
        first.set(k.clone(), Category::Billing, json!({"billing": []}), MINUTE);
        drop(first);

        let mut second = CacheStore::new(durable.clone(), clock.clone());
        assert!(second.is_empty());
        assert_eq!(second.get(&k), Some(json!({"billing": []})));
        assert_eq!(second.len(), 1);
        assert_eq!(second.stats().promotions, 1);
    }

    #[test]
    fn test_expired_durable_entry_is_deleted() {
        let durable = MemoryDurableStore::new();
        let clock = Arc::new(ManualClock::starting_now());
        let k = key("/expenses");

        CacheStore::new(durable.clone(), clock.clone()).set(
            k.clone(),
            Category::Expenses,
            json!([]),
            MINUTE,
        );
        clock.advance(2 * MINUTE);

        let mut store = CacheStore::new(durable.clone(), clock);
        assert!(store.get(&k).is_none());
        assert!(durable.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_durable_failure_keeps_memory_tier() {
        let durable = MemoryDurableStore::with_quota(16);
        let failures = Arc::new(AtomicUsize::new(0));
        let seen = failures.clone();
        let clock = Arc::new(ManualClock::starting_now());
        let mut store = CacheStore::new(durable.clone(), clock).with_durable_error_hook(
            move |error| {
                assert!(matches!(error, StorageError::QuotaExceeded { .. }));
                seen.fetch_add(1, Ordering::SeqCst);
            },
        );
        let k = key("/dashboard/summary");

        store.set(k.clone(), Category::Dashboard, json!({"total": 10}), MINUTE);

        assert_eq!(store.get(&k), Some(json!({"total": 10})));
        assert!(durable.is_empty());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert_eq!(store.stats().durable_failures, 1);
    }

    #[test]
    fn test_corrupt_durable_entry_is_dropped() {
        let mut durable = MemoryDurableStore::new();
        let k = key("/projects/7");
        durable.save(&k, "{not json").unwrap();

        let (mut store, _clock) = store_with(&durable);
        assert!(store.get(&k).is_none());
        assert!(durable.is_empty());
        assert_eq!(store.stats().durable_failures, 1);
    }

    #[test]
    fn test_zero_ttl_is_not_stored() {
        let durable = MemoryDurableStore::new();
        let (mut store, _clock) = store_with(&durable);
        let k = key("/users");

        store.set(k.clone(), Category::Users, json!(1), MINUTE);
        store.set(k.clone(), Category::Users, json!(2), Duration::ZERO);

        assert!(store.get(&k).is_none());
        assert!(durable.is_empty());
    }

    #[test]
    fn test_clear_matching_substring() {
        let durable = MemoryDurableStore::new();
        let (mut store, _clock) = store_with(&durable);

        store.set(key("/projects"), Category::Projects, json!(1), MINUTE);
        store.set(key("/projects/3"), Category::Projects, json!(2), MINUTE);
        store.set(key("/users"), Category::Users, json!(3), MINUTE);

        assert_eq!(store.clear_matching("projects"), 2);
        assert!(store.get(&key("/projects")).is_none());
        assert!(store.get(&key("/users")).is_some());
        assert_eq!(durable.len(), 1);
        assert_eq!(store.stats().invalidations, 2);
    }

    #[test]
    fn test_clear_matching_is_case_sensitive() {
        let mut store = CacheStore::memory_only();
        store.set(key("/projects"), Category::Projects, json!(1), MINUTE);

        assert_eq!(store.clear_matching("Projects"), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_matching_empty_clears_namespace_only() {
        let mut durable = MemoryDurableStore::new();
        durable.save("theme", "dark").unwrap();
        let (mut store, _clock) = store_with(&durable);

        store.set(key("/projects"), Category::Projects, json!(1), MINUTE);
        store.set(key("/users"), Category::Users, json!(2), MINUTE);

        assert_eq!(store.clear_matching(""), 2);
        assert!(store.is_empty());
        assert_eq!(durable.keys().unwrap(), vec!["theme".to_string()]);
    }

    #[test]
    fn test_clear_matching_reaches_durable_only_entries() {
        let durable = MemoryDurableStore::new();
        let clock = Arc::new(ManualClock::starting_now());
        CacheStore::new(durable.clone(), clock.clone()).set(
            key("/revenue"),
            Category::Revenue,
            json!(1),
            MINUTE,
        );

        let mut store = CacheStore::new(durable.clone(), clock);
        assert_eq!(store.clear_matching("revenue"), 1);
        assert!(durable.is_empty());
    }

    #[test]
    fn test_clear_category_ignores_url_text() {
        let durable = MemoryDurableStore::new();
        let (mut store, _clock) = store_with(&durable);

        // A users endpoint whose path happens to mention projects
        store.set(
            key("/users/projects-admins"),
            Category::Users,
            json!(1),
            MINUTE,
        );
        store.set(key("/projects"), Category::Projects, json!(2), MINUTE);

        assert_eq!(store.clear_category(Category::Projects), 1);
        assert!(store.get(&key("/users/projects-admins")).is_some());
        assert!(store.get(&key("/projects")).is_none());
        assert_eq!(durable.len(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let durable = MemoryDurableStore::new();
        let (mut store, clock) = store_with(&durable);

        store.set(key("/dashboard"), Category::Dashboard, json!(1), MINUTE);
        store.set(key("/company"), Category::Company, json!(2), 30 * MINUTE);
        clock.advance(2 * MINUTE);

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(durable.len(), 1);
        assert!(store.get(&key("/company")).is_some());
    }

    /// Counts single and batched removals reaching the durable tier.
    #[derive(Debug, Default, Clone)]
    struct CountingStore {
        inner: MemoryDurableStore,
        single_removes: Arc<AtomicUsize>,
        batch_removes: Arc<AtomicUsize>,
    }

    impl DurableStore for CountingStore {
        fn load(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.load(key)
        }

        fn save(&mut self, key: &str, raw: &str) -> StorageResult<()> {
            self.inner.save(key, raw)
        }

        fn remove(&mut self, key: &str) -> StorageResult<()> {
            self.single_removes.fetch_add(1, Ordering::SeqCst);
            self.inner.remove(key)
        }

        fn remove_many(&mut self, keys: &[String]) -> StorageResult<()> {
            self.batch_removes.fetch_add(1, Ordering::SeqCst);
            self.inner.remove_many(keys)
        }

        fn keys(&self) -> StorageResult<Vec<String>> {
            self.inner.keys()
        }
    }

    #[test]
    fn test_bulk_removals_are_batched() {
        let durable = CountingStore::default();
        let clock = Arc::new(ManualClock::starting_now());
        let mut store = CacheStore::new(durable.clone(), clock.clone());

        for endpoint in ["/projects", "/projects/1", "/projects/2"] {
            store.set(key(endpoint), Category::Projects, json!(1), MINUTE);
        }
        for endpoint in ["/users", "/users/1"] {
            store.set(key(endpoint), Category::Users, json!(2), MINUTE);
        }
        store.set(key("/company"), Category::Company, json!(3), 30 * MINUTE);

        assert_eq!(store.clear_category(Category::Projects), 3);
        assert_eq!(store.clear_matching("/users"), 2);
        clock.advance(2 * MINUTE);
        assert_eq!(store.purge_expired(), 0);

        assert_eq!(durable.single_removes.load(Ordering::SeqCst), 0);
        assert_eq!(durable.batch_removes.load(Ordering::SeqCst), 2);
        assert_eq!(durable.inner.len(), 1);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::memory_only();
        let k = key("/projects");

        store.set(k.clone(), Category::Projects, json!(1), MINUTE);
        store.get(&k);
        store.get(&key("/missing"));

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
