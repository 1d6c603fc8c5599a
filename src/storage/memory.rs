//! In-process storage backend.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{item_size, KeyValueStorage};
use crate::error::StorageError;

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<String, String>,
    used: usize,
}

// == Memory Storage ==
/// Map-backed storage shared between clones.
///
/// Cloning yields another handle onto the same items, so several caches can
/// share one store the way browser tabs share an origin's storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
    /// Capacity in bytes, None = unbounded
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes past `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: Arc::default(),
            quota: Some(quota),
        }
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();

        let replaced = inner
            .items
            .get(key)
            .map(|old| item_size(key, old))
            .unwrap_or(0);
        let needed = inner.used - replaced + item_size(key, value);

        if let Some(capacity) = self.quota {
            if needed > capacity {
                return Err(StorageError::QuotaExceeded { needed, capacity });
            }
        }

        inner.items.insert(key.to_string(), value.to_string());
        inner.used = needed;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        if let Some(old) = inner.items.remove(key) {
            inner.used -= item_size(key, &old);
        }
        Ok(())
    }
}
