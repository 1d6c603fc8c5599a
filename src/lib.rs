//! Weather Cache - Two-tier cache for weather and geocoding lookups
//!
//! A bounded memory tier in front of a persistent key-value tier, with TTL
//! expiry, insertion-order eviction, promotion between tiers and a small
//! HTTP sidecar exposing the service.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::{get_or_fetch, CacheService, SetOptions, SharedCacheService};
pub use config::{CacheCategory, Config};
pub use tasks::spawn_cleanup_task;
