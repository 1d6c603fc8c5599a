//! Memory Cache Module
//!
//! Bounded in-process tier combining HashMap storage with insertion-order
//! eviction and lazy TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheCounters, CacheEntry, InsertionTracker, MemoryStats};
use crate::error::Result;

// == Memory Cache ==
/// Volatile cache tier bounded by entry count and estimated byte size.
///
/// Eviction removes the least-recently-inserted entry; reads never change
/// eviction order.
#[derive(Debug)]
pub struct MemoryCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion order for eviction
    order: InsertionTracker,
    /// Hit, miss, eviction and size accounting
    counters: CacheCounters,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Maximum sum of entry sizes in bytes
    max_memory_bytes: usize,
    /// TTL used when the caller does not pick one
    default_ttl: Duration,
}

impl<V: Serialize + Clone> MemoryCache<V> {
    // == Constructor ==
    /// Creates a new MemoryCache with the given ceilings and default TTL.
    pub fn new(max_entries: usize, max_memory_bytes: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionTracker::new(),
            counters: CacheCounters::new(),
            max_entries,
            max_memory_bytes,
            default_ttl,
        }
    }

    // == Set ==
    /// Stores `data` under `key` for `ttl`.
    ///
    /// An existing entry for the key is replaced. Oldest insertions are
    /// evicted until the new entry fits both ceilings. Failures are logged
    /// and leave the cache unchanged.
    pub fn set(&mut self, key: &str, data: V, ttl: Duration) {
        if let Err(e) = self.try_set(key, data, ttl) {
            warn!(key, error = %e, "memory cache: failed to store entry");
        }
    }

    fn try_set(&mut self, key: &str, data: V, ttl: Duration) -> Result<()> {
        let size = serde_json::to_vec(&data)?.len();

        if size > self.max_memory_bytes {
            warn!(
                key,
                size,
                max = self.max_memory_bytes,
                "memory cache: entry larger than the memory ceiling, not cached"
            );
            return Ok(());
        }

        self.remove_entry(key);

        while !self.entries.is_empty()
            && (self.counters.total_size + size > self.max_memory_bytes
                || self.counters.total_entries >= self.max_entries)
        {
            if !self.evict_oldest() {
                break;
            }
        }

        // Zero capacity leaves nothing to evict into
        if self.counters.total_entries >= self.max_entries {
            return Ok(());
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(key.to_string(), data, ttl, size));
        self.order.record_insert(key);
        self.counters.add_entry(size);

        Ok(())
    }

    // == Get ==
    /// Retrieves a clone of the value for `key`.
    ///
    /// Absent and expired keys count as misses; expired entries are removed.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if self.expire_if_stale(key) {
            self.counters.record_miss();
            return None;
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.hits += 1;
                self.counters.record_hit();
                Some(entry.data.clone())
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Checks whether a live entry exists without touching hit/miss counters.
    pub fn has(&mut self, key: &str) -> bool {
        !self.expire_if_stale(key) && self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Clear ==
    /// Drops every entry and resets all counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.counters = CacheCounters::new();
    }

    // == Stats ==
    /// Returns a snapshot of the tier's statistics.
    pub fn stats(&self) -> MemoryStats {
        MemoryStats::from(&self.counters)
    }

    /// Returns the hit count of a live entry.
    pub fn entry_hits(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.hits)
    }

    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Internals ==
    /// Removes `key` if it has expired, returning whether it did.
    fn expire_if_stale(&mut self, key: &str) -> bool {
        let expired = self
            .entries
            .get(key)
            .map(|entry| entry.is_expired())
            .unwrap_or(false);

        if expired {
            self.remove_entry(key);
            debug!(key, "memory cache: entry expired");
        }
        expired
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.order.remove(key);
                self.counters.remove_entry(entry.size);
                true
            }
            None => false,
        }
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(oldest) = self.order.evict_oldest() else {
            return false;
        };

        if let Some(entry) = self.entries.remove(&oldest) {
            self.counters.remove_entry(entry.size);
            self.counters.record_eviction();
            debug!(key = %oldest, size = entry.size, "memory cache: evicted entry");
        }
        true
    }
}
