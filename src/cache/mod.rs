//! Cache Module
//!
//! Two-tier caching in front of weather and geocoding lookups: a bounded
//! memory tier with insertion-order eviction, a persistent tier over a
//! key-value storage backend, and the service that composes them.

mod entry;
mod eviction;
mod keys;
mod memory;
mod persistent;
mod read_through;
mod service;
mod stats;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, StoredEntry};
pub use eviction::InsertionTracker;
pub use keys::{generate_geocoding_key, generate_weather_key, DEFAULT_WEATHER_KIND};
pub use memory::MemoryCache;
pub use persistent::{PersistentCache, ENTRY_PREFIX, METADATA_KEY};
pub use read_through::get_or_fetch;
pub use service::{CacheService, SetOptions, SharedCacheService};
pub use stats::{format_bytes, CacheCounters, MemoryStats, PersistentStats, ServiceStats};
