//! API Client Module
//!
//! The HTTP client wrapper every resource collaborator goes through. Reads
//! are served read-through from the cache; mutations go to the network and
//! invalidate what they changed.

mod resources;

pub use resources::Resource;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{
    build_key, shared, CacheStats, CacheStore, FileDurableStore, NoDurableStore, SharedCache,
    SystemClock,
};
use crate::config::Config;
use crate::error::TransportError;
use crate::invalidation::InvalidationBus;
use crate::models::{Category, MutationRequest, ReadRequest, ResponseEnvelope};
use crate::policy::CachePolicy;
use crate::tasks::spawn_expiry_reaper;
use crate::transport::{ReqwestTransport, Transport};

/// Caching client over a [`Transport`].
///
/// Cheap to clone; clones share the transport, the cache and the policy.
#[derive(Debug)]
pub struct ApiClient<T> {
    transport: Arc<T>,
    cache: SharedCache,
    policy: Arc<CachePolicy>,
    bus: InvalidationBus,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache: Arc::clone(&self.cache),
            policy: Arc::clone(&self.policy),
            bus: self.bus.clone(),
        }
    }
}

impl ApiClient<ReqwestTransport> {
    /// Builds a client from configuration.
    ///
    /// An unusable durable cache file degrades to a memory-only cache rather
    /// than failing construction.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout),
        )
        .context("Failed to build HTTP transport")?;

        let clock = Arc::new(SystemClock);
        let store = match &config.durable_path {
            Some(path) => match FileDurableStore::open(path, config.durable_quota_bytes) {
                Ok(durable) => CacheStore::new(durable, clock),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Durable cache unavailable, continuing memory-only"
                    );
                    CacheStore::new(NoDurableStore, clock)
                }
            },
            None => CacheStore::new(NoDurableStore, clock),
        };

        info!(
            base_url = %config.api_base_url,
            durable = config.durable_path.is_some(),
            "API client initialized"
        );

        Ok(Self::new(transport, store, config.policy()))
    }
}

impl<T: Transport> ApiClient<T> {
    // == Constructor ==
    pub fn new(transport: T, store: CacheStore, policy: CachePolicy) -> Self {
        let cache = shared(store);
        Self {
            transport: Arc::new(transport),
            bus: InvalidationBus::new(cache.clone()),
            cache,
            policy: Arc::new(policy),
        }
    }

    /// Shared handle to the underlying store.
    pub fn cache(&self) -> SharedCache {
        Arc::clone(&self.cache)
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn invalidation(&self) -> &InvalidationBus {
        &self.bus
    }

    /// Current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Starts the background expiry sweep for this client's cache.
    pub fn spawn_reaper(&self, interval: Duration) -> JoinHandle<()> {
        spawn_expiry_reaper(self.cache(), interval)
    }

    /// Collaborator bound to `category` under `base_path`.
    pub fn resource(&self, category: Category, base_path: impl Into<String>) -> Resource<'_, T> {
        Resource::new(self, category, base_path)
    }

    // == Read ==
    /// Performs a read, serving it from the cache when possible.
    ///
    /// On a hit the transport is not called and the envelope is tagged
    /// `from_cache`. On a miss the live response is cached with the
    /// category's TTL. Transport errors are returned as-is and cache nothing.
    pub async fn get(&self, request: ReadRequest) -> Result<ResponseEnvelope, TransportError> {
        if !request.use_cache {
            debug!(endpoint = %request.endpoint, "Cache bypassed");
            let response = self.transport.send(request.to_http()).await?;
            return Ok(ResponseEnvelope::live(response));
        }

        let key = build_key(&request.endpoint, &request.params);

        // The lock is released before the network call.
        let cached = self.cache.write().await.get(&key);
        if let Some(data) = cached {
            return Ok(ResponseEnvelope::cached(data));
        }

        let response = self.transport.send(request.to_http()).await?;

        if response.is_success() {
            let ttl = self.policy.ttl_for_category(request.category);
            self.cache
                .write()
                .await
                .set(key, request.category, response.data.clone(), ttl);
            debug!(
                endpoint = %request.endpoint,
                category = %request.category,
                ttl_secs = ttl.as_secs(),
                "Response cached"
            );
        }

        Ok(ResponseEnvelope::live(response))
    }

    // == Mutate ==
    /// Sends a create/update/delete and, once it has succeeded, invalidates
    /// its category and the categories derived from it.
    ///
    /// Errors and non-2xx responses invalidate nothing.
    pub async fn mutate(
        &self,
        request: MutationRequest,
    ) -> Result<ResponseEnvelope, TransportError> {
        let response = self.transport.send(request.to_http()).await?;
        if response.is_success() {
            self.bus.invalidate(request.category).await;
        } else {
            debug!(
                endpoint = %request.endpoint,
                status = response.status,
                "Mutation not applied, cache kept"
            );
        }
        Ok(ResponseEnvelope::live(response))
    }

    // == Identity ==
    /// Drops every cached entry. Call on login, logout and registration.
    pub async fn identity_changed(&self) -> usize {
        self.bus.invalidate_all().await
    }
}
