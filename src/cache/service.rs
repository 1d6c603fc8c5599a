//! Cache Service Module
//!
//! Façade over the memory and persistent tiers. Reads check memory first and
//! promote persistent hits into memory; writes go to the tiers selected by
//! [`SetOptions`]; deletes and clears always reach both tiers.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{MemoryCache, PersistentCache, ServiceStats};
use crate::config::{CacheCategory, CacheTtls, Config};
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage, UnavailableStorage};

/// Service handle shared by the HTTP handlers, the cleanup task and
/// read-through callers.
pub type SharedCacheService = Arc<RwLock<CacheService>>;

// == Set Options ==
/// Where and for how long a `set` stores its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// TTL for the entry, None = the service default
    pub ttl: Option<Duration>,
    /// Write to the persistent tier
    pub persistent: bool,
    /// Write to the memory tier
    pub memory: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            persistent: false,
            memory: true,
        }
    }
}

impl SetOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }
}

// == Cache Service ==
/// Two-tier cache: a bounded memory tier in front of a persistent tier.
///
/// Reads check memory first and promote persistent hits into memory.
#[derive(Debug)]
pub struct CacheService {
    memory: MemoryCache<Value>,
    persistent: PersistentCache,
    ttls: CacheTtls,
}

impl CacheService {
    // == Constructor ==
    /// Creates a service whose persistent tier runs on `storage`.
    pub fn new(config: &Config, storage: Box<dyn KeyValueStorage>) -> Self {
        Self {
            memory: MemoryCache::new(
                config.max_entries,
                config.max_memory_bytes,
                config.default_ttl(),
            ),
            persistent: PersistentCache::new(storage),
            ttls: config.ttls.clone(),
        }
    }

    /// Creates a service with the storage backend named by `config`.
    ///
    /// A file that cannot be opened leaves the persistent tier disabled.
    pub fn from_config(config: &Config) -> Self {
        let storage: Box<dyn KeyValueStorage> = match &config.storage_path {
            Some(path) => match FileStorage::open(path, config.storage_quota_bytes) {
                Ok(storage) => Box::new(storage),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cache service: cannot open storage file");
                    Box::new(UnavailableStorage::new(e.to_string()))
                }
            },
            None => Box::new(MemoryStorage::with_quota(config.storage_quota_bytes)),
        };
        Self::new(config, storage)
    }

    /// Wraps the service for sharing across tasks.
    pub fn into_shared(self) -> SharedCacheService {
        Arc::new(RwLock::new(self))
    }

    /// Options storing a value for the TTL configured for `category`.
    pub fn options_for(&self, category: CacheCategory) -> SetOptions {
        SetOptions::default().with_ttl(self.ttls.for_category(category))
    }

    // == Set ==
    /// Stores `data` under `key` in the tiers chosen by `options`.
    pub fn set<T: Serialize>(&mut self, key: &str, data: &T, options: SetOptions) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "cache service: value is not serializable");
                return;
            }
        };
        let ttl = options.ttl.unwrap_or_else(|| self.memory.default_ttl());

        if options.persistent {
            self.persistent.set(key, &value, ttl);
        }
        if options.memory {
            self.memory.set(key, value, ttl);
        }
    }

    // == Get ==
    /// Retrieves the value for `key` decoded as `T`.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get_value(key)?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(key, error = %e, "cache service: cached value has unexpected shape");
                None
            }
        }
    }

    /// Retrieves the untyped value for `key`.
    ///
    /// A persistent hit is copied into memory for the rest of its
    /// persistent lifetime.
    pub fn get_value(&mut self, key: &str) -> Option<Value> {
        if let Some(value) = self.memory.get(key) {
            return Some(value);
        }

        let entry = self.persistent.get_entry(key)?;
        let ttl = entry.ttl_remaining();
        debug!(key, ttl_ms = ttl.as_millis() as u64, "cache service: promoting persistent hit");
        self.memory.set(key, entry.data.clone(), ttl);
        Some(entry.data)
    }

    // == Delete ==
    /// Removes `key` from both tiers.
    pub fn delete(&mut self, key: &str) {
        self.memory.delete(key);
        self.persistent.delete(key);
    }

    // == Clear ==
    /// Empties both tiers.
    pub fn clear(&mut self) {
        self.memory.clear();
        self.persistent.clear();
    }

    // == Cleanup ==
    /// Sweeps stale entries from the persistent tier.
    pub fn cleanup(&mut self) -> usize {
        self.persistent.cleanup()
    }

    // == Stats ==
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            memory: self.memory.stats(),
            persistent: self.persistent.stats(),
        }
    }

    pub fn memory(&self) -> &MemoryCache<Value> {
        &self.memory
    }

    pub fn persistent(&self) -> &PersistentCache {
        &self.persistent
    }
}
