//! Persistent Cache Module
//!
//! Durable cache tier over a [`KeyValueStorage`] backend. Entries survive
//! restarts; a metadata index tracks every written key so expired entries
//! can be swept even if nobody reads them again.
//!
//! Every storage failure is logged and degrades to a miss or a dropped
//! write. When the backend fails its probe at construction the tier stays
//! disabled for the life of the instance.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::stats::{format_bytes, PersistentStats};
use crate::cache::StoredEntry;
use crate::error::Result;
use crate::storage::KeyValueStorage;

/// Namespace prepended to every entry key.
pub const ENTRY_PREFIX: &str = "weather_cache:";

/// Storage key of the metadata index. Never produced by `ENTRY_PREFIX + key`.
pub const METADATA_KEY: &str = "weather_cache.metadata";

// == Metadata ==
/// Index of tracked keys, persisted alongside the entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Metadata {
    keys: Vec<String>,
    /// Approximate bytes written; not reduced on delete or expiry
    total_size: u64,
    /// Unix milliseconds of the last sweep, 0 = never
    last_cleanup: u64,
}

// == Persistent Cache ==
/// Durable tier storing [`StoredEntry`] records under `ENTRY_PREFIX`.
///
/// Disabled for its whole life when the backend fails the startup probe.
pub struct PersistentCache {
    storage: Box<dyn KeyValueStorage>,
    metadata: Metadata,
    available: bool,
}

impl PersistentCache {
    // == Constructor ==
    /// Probes `storage` and loads the metadata index.
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        let available = match storage.probe() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "persistent cache: storage unavailable, tier disabled");
                false
            }
        };

        let mut cache = Self {
            storage,
            metadata: Metadata::default(),
            available,
        };
        if available {
            cache.metadata = cache.load_metadata();
            info!(
                keys = cache.metadata.keys.len(),
                "persistent cache: metadata index loaded"
            );
        }
        cache
    }

    /// Whether the backend passed its probe.
    pub fn is_available(&self) -> bool {
        self.available
    }

    // == Set ==
    /// Stores `data` under `key` for `ttl`. Failures drop the write.
    pub fn set<T: Serialize>(&mut self, key: &str, data: &T, ttl: Duration) {
        if !self.available {
            return;
        }
        if let Err(e) = self.try_set(key, data, ttl) {
            warn!(key, error = %e, "persistent cache: failed to store entry");
        }
    }

    fn try_set<T: Serialize>(&mut self, key: &str, data: &T, ttl: Duration) -> Result<()> {
        let entry = StoredEntry::new(serde_json::to_value(data)?, ttl);
        let raw = serde_json::to_string(&entry)?;

        if let Err(e) = self.storage.set_item(&storage_key(key), &raw) {
            warn!(key, error = %e, "persistent cache: storage rejected write");
            return Ok(());
        }

        if !self.metadata.keys.iter().any(|k| k == key) {
            self.metadata.keys.push(key.to_string());
        }
        self.metadata.total_size += raw.len() as u64;
        self.save_metadata();
        Ok(())
    }

    // == Get ==
    /// Retrieves the value for `key` decoded as `T`.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let entry = self.get_entry(key)?;
        match serde_json::from_value(entry.data) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "persistent cache: stored value has unexpected shape");
                None
            }
        }
    }

    /// Retrieves the whole stored unit for `key`.
    ///
    /// Expired units are deleted; corrupt ones read as a miss and are left
    /// for `cleanup`.
    pub fn get_entry(&mut self, key: &str) -> Option<StoredEntry> {
        if !self.available {
            return None;
        }

        let entry = match self.read_entry(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "persistent cache: unreadable entry");
                return None;
            }
        };

        if entry.is_expired() {
            debug!(key, "persistent cache: entry expired");
            self.delete(key);
            return None;
        }
        Some(entry)
    }

    // == Delete ==
    /// Removes `key` from storage and from the index.
    pub fn delete(&mut self, key: &str) {
        if !self.available {
            return;
        }
        if let Err(e) = self.storage.remove_item(&storage_key(key)) {
            warn!(key, error = %e, "persistent cache: failed to remove entry");
        }
        self.metadata.keys.retain(|k| k != key);
        self.save_metadata();
    }

    // == Clear ==
    /// Removes every tracked entry and the index itself.
    pub fn clear(&mut self) {
        if !self.available {
            return;
        }
        for key in &self.metadata.keys {
            if let Err(e) = self.storage.remove_item(&storage_key(key)) {
                warn!(key = %key, error = %e, "persistent cache: failed to remove entry");
            }
        }
        if let Err(e) = self.storage.remove_item(METADATA_KEY) {
            warn!(error = %e, "persistent cache: failed to remove metadata index");
        }
        self.metadata = Metadata::default();
    }

    // == Cleanup ==
    /// Sweeps every tracked key, deleting absent, corrupt and expired entries.
    ///
    /// Returns the number of keys removed.
    pub fn cleanup(&mut self) -> usize {
        if !self.available {
            return 0;
        }

        let stale: Vec<String> = self
            .metadata
            .keys
            .iter()
            .filter(|key| match self.read_entry(key) {
                Ok(Some(entry)) => entry.is_expired(),
                Ok(None) => true,
                Err(e) => {
                    debug!(key = %key, error = %e, "persistent cache: dropping corrupt entry");
                    true
                }
            })
            .cloned()
            .collect();

        for key in &stale {
            if let Err(e) = self.storage.remove_item(&storage_key(key)) {
                warn!(key = %key, error = %e, "persistent cache: failed to remove stale entry");
            }
        }
        self.metadata.keys.retain(|k| !stale.contains(k));
        self.metadata.last_cleanup = current_timestamp_ms();
        self.save_metadata();

        stale.len()
    }

    // == Stats ==
    /// Returns a snapshot of the tier's statistics.
    pub fn stats(&self) -> PersistentStats {
        let last_cleanup = match self.metadata.last_cleanup {
            0 => None,
            ms => chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms as i64)
                .map(|t| t.to_rfc3339()),
        };

        PersistentStats {
            available: self.available,
            total_entries: self.metadata.keys.len(),
            total_size: self.metadata.total_size,
            storage_usage: format_bytes(self.metadata.total_size),
            last_cleanup,
        }
    }

    /// Tracked keys in insertion order.
    pub fn keys(&self) -> &[String] {
        &self.metadata.keys
    }

    // == Internals ==
    fn read_entry(&self, key: &str) -> Result<Option<StoredEntry>> {
        match self.storage.get_item(&storage_key(key))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn load_metadata(&self) -> Metadata {
        let raw = match self.storage.get_item(METADATA_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Metadata::default(),
            Err(e) => {
                warn!(error = %e, "persistent cache: failed to read metadata index");
                return Metadata::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "persistent cache: corrupt metadata index, starting empty");
            Metadata::default()
        })
    }

    fn save_metadata(&self) {
        let raw = match serde_json::to_string(&self.metadata) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "persistent cache: failed to encode metadata index");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(METADATA_KEY, &raw) {
            warn!(error = %e, "persistent cache: failed to persist metadata index");
        }
    }
}

impl std::fmt::Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache")
            .field("available", &self.available)
            .field("keys", &self.metadata.keys.len())
            .finish()
    }
}

fn storage_key(key: &str) -> String {
    format!("{}{}", ENTRY_PREFIX, key)
}
