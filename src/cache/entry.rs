//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::clock::add_duration;
use crate::models::Category;

// == Cache Entry ==
/// A cached response body and its expiry metadata.
///
/// This is also the record stored in the durable tier, as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key this entry was stored under
    pub key: String,
    /// Category of the endpoint that produced the payload
    pub category: Category,
    /// The response body
    pub payload: Value,
    /// When the entry was stored
    pub cached_at: DateTime<Utc>,
    /// When the entry stops being served
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stored at `now` that lives for `ttl`.
    pub fn new(
        key: impl Into<String>,
        category: Category,
        payload: Value,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            key: key.into(),
            category,
            payload,
            cached_at: now,
            expires_at: add_duration(now, ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: the entry is expired once `now >= expires_at`,
    /// so it is live only strictly before its expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`, zero once expired.
    pub fn ttl_remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}
