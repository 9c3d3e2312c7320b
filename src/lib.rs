//! BuildTrack Cache - Read-through response caching for the BuildTrack API
//!
//! Serves repeat reads from a dual-tier (memory + durable) cache with
//! per-category TTLs, and invalidates by category after successful writes.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod models;
pub mod policy;
pub mod tasks;
pub mod transport;

pub use cache::{CacheStore, SharedCache};
pub use client::{ApiClient, Resource};
pub use config::Config;
pub use error::{StorageError, TransportError};
pub use invalidation::InvalidationBus;
pub use models::{Category, MutationRequest, ReadRequest, ResponseEnvelope};
pub use policy::CachePolicy;
pub use tasks::spawn_expiry_reaper;
pub use transport::{ReqwestTransport, Transport};
