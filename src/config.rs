//! Configuration Module
//!
//! Handles loading client and cache configuration from environment variables.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_QUOTA_BYTES;
use crate::models::Category;
use crate::policy::CachePolicy;

/// Client and cache configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root URL of the remote API
    pub api_base_url: String,
    /// Per-request transport timeout in seconds
    pub request_timeout: u64,
    /// TTL in seconds for categories without an override
    pub default_ttl: u64,
    /// Per-category TTL overrides in seconds
    pub category_ttls: HashMap<Category, u64>,
    /// Expiry reaper interval in seconds
    pub reaper_interval: u64,
    /// File backing the durable tier; `None` runs memory-only
    pub durable_path: Option<PathBuf>,
    /// Durable tier quota in bytes
    pub durable_quota_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `API_BASE_URL` - API root (default: http://localhost:8080/api)
    /// - `API_TIMEOUT` - Request timeout in seconds (default: 30)
    /// - `CACHE_DEFAULT_TTL` - Fallback TTL in seconds (default: 300)
    /// - `CACHE_TTL_<CATEGORY>` - TTL override, e.g. `CACHE_TTL_DASHBOARD=60`
    /// - `CACHE_REAPER_INTERVAL` - Sweep frequency in seconds (default: 600)
    /// - `CACHE_DURABLE_PATH` - Durable tier file (default: unset, memory-only)
    /// - `CACHE_DURABLE_QUOTA` - Durable tier quota in bytes (default: 5 MiB)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    ///
    /// Unparsable and zero numeric values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |name: &str| {
            lookup(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
        };

        let category_ttls = Category::ALL
            .into_iter()
            .filter_map(|category| {
                let name = format!("CACHE_TTL_{}", category.as_str().to_ascii_uppercase());
                number(&name).map(|ttl| (category, ttl))
            })
            .collect();

        Self {
            api_base_url: lookup("API_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.api_base_url),
            request_timeout: number("API_TIMEOUT").unwrap_or(defaults.request_timeout),
            default_ttl: number("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            category_ttls,
            reaper_interval: number("CACHE_REAPER_INTERVAL").unwrap_or(defaults.reaper_interval),
            durable_path: lookup("CACHE_DURABLE_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            durable_quota_bytes: number("CACHE_DURABLE_QUOTA")
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(defaults.durable_quota_bytes),
        }
    }

    /// Builds the TTL policy: built-in category TTLs, then overrides.
    pub fn policy(&self) -> CachePolicy {
        self.category_ttls.iter().fold(
            CachePolicy::default().with_default_ttl(Duration::from_secs(self.default_ttl)),
            |policy, (category, ttl)| policy.with_ttl(*category, Duration::from_secs(*ttl)),
        )
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            request_timeout: 30,
            default_ttl: 300,
            category_ttls: HashMap::new(),
            reaper_interval: 600,
            durable_path: None,
            durable_quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}
