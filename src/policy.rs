//! Cache Policy Module
//!
//! Per-category TTLs. Built once at startup and read-only afterwards.

use std::collections::HashMap;
use std::time::Duration;

use crate::models::Category;

/// TTL used when a category has no entry of its own.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Maps resource categories to cache lifetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    default_ttl: Duration,
    ttls: HashMap<Category, Duration>,
}

impl CachePolicy {
    /// Creates a policy with no per-category entries.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            ttls: HashMap::new(),
        }
    }

    /// Sets the TTL of `category`.
    pub fn with_ttl(mut self, category: Category, ttl: Duration) -> Self {
        self.ttls.insert(category, ttl);
        self
    }

    /// Replaces the fallback TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// TTL for calls on `endpoint`, inferring the category from the path.
    ///
    /// Prefer [`ttl_for_category`](Self::ttl_for_category) when the caller
    /// knows its category.
    pub fn ttl_for(&self, endpoint: &str) -> Duration {
        self.ttl_for_category(Category::infer(endpoint))
    }

    /// TTL for `category`, or the default TTL.
    pub fn ttl_for_category(&self, category: Category) -> Duration {
        self.ttls
            .get(&category)
            .copied()
            .unwrap_or(self.default_ttl)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl Default for CachePolicy {
    /// Built-in lifetimes, shortest for the dashboard aggregates.
    fn default() -> Self {
        const MINUTE: u64 = 60;
        Self::new(DEFAULT_TTL)
            .with_ttl(Category::Dashboard, Duration::from_secs(2 * MINUTE))
            .with_ttl(Category::Revenue, Duration::from_secs(3 * MINUTE))
            .with_ttl(Category::Expenses, Duration::from_secs(3 * MINUTE))
            .with_ttl(Category::Billing, Duration::from_secs(3 * MINUTE))
            .with_ttl(Category::Collections, Duration::from_secs(3 * MINUTE))
            .with_ttl(Category::Projects, Duration::from_secs(5 * MINUTE))
            .with_ttl(Category::Users, Duration::from_secs(10 * MINUTE))
            .with_ttl(Category::Company, Duration::from_secs(30 * MINUTE))
    }
}
