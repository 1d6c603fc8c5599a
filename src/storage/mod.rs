//! Storage Module
//!
//! String key-value backends the persistent cache tier runs on.
//!
//! # Backends
//! - `MemoryStorage`: process-shared map, cloned handles see the same data
//! - `FileStorage`: a single JSON document on disk

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// Key written and removed by [`KeyValueStorage::probe`].
pub const PROBE_KEY: &str = "__weather_cache_probe__";

// == Key Value Storage ==
/// Synchronous string key-value store with a capacity ceiling.
///
/// Every write may fail (quota, I/O, disabled backend); reads of a missing
/// key return `Ok(None)`.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Checks the backend accepts writes with a throwaway key.
    fn probe(&self) -> Result<(), StorageError> {
        self.set_item(PROBE_KEY, PROBE_KEY)?;
        self.remove_item(PROBE_KEY)
    }
}

/// Bytes a key-value pair occupies against a quota.
pub(crate) fn item_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

// == Unavailable Storage ==
/// Backend that rejects every call.
///
/// Stands in when the configured backend cannot be opened, so the
/// persistent tier fails its probe and stays disabled.
#[derive(Debug, Clone, Default)]
pub struct UnavailableStorage {
    reason: String,
}

impl UnavailableStorage {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> StorageError {
        StorageError::Unavailable(self.reason.clone())
    }
}

impl KeyValueStorage for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(self.error())
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(self.error())
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(self.error())
    }
}
