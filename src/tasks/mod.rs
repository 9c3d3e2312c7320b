//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the client.
//!
//! # Tasks
//! - Expiry reaper: purges expired cache entries from both tiers

mod reaper;

pub use reaper::{spawn_expiry_reaper, DEFAULT_REAPER_INTERVAL};
