//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions,
//! and builds the per-tier and merged reports.

use serde::Serialize;

// == Cache Counters ==
/// Memory-tier counters, adjusted on every operation and reset by `clear()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheCounters {
    /// Number of successful reads
    pub hits: u64,
    /// Number of failed reads (absent or expired)
    pub misses: u64,
    /// Number of entries evicted to satisfy the ceilings
    pub evictions: u64,
    /// Current number of entries
    pub total_entries: usize,
    /// Sum of entry sizes in bytes
    pub total_size: usize,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates counters with every value at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Entry Accounting ==
    /// Accounts for an inserted entry of `size` bytes.
    pub fn add_entry(&mut self, size: usize) {
        self.total_entries += 1;
        self.total_size += size;
    }

    /// Accounts for a removed entry of `size` bytes.
    pub fn remove_entry(&mut self, size: usize) {
        self.total_entries = self.total_entries.saturating_sub(1);
        self.total_size = self.total_size.saturating_sub(size);
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Returns total_size / total_entries, or 0.0 when empty.
    pub fn average_entry_size(&self) -> f64 {
        if self.total_entries == 0 {
            0.0
        } else {
            self.total_size as f64 / self.total_entries as f64
        }
    }
}

// == Memory Stats ==
/// Snapshot of the memory tier.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_entries: usize,
    pub total_size: usize,
    pub hit_rate: f64,
    pub average_entry_size: f64,
    /// Human-readable total size
    pub memory_usage: String,
}

impl From<&CacheCounters> for MemoryStats {
    fn from(counters: &CacheCounters) -> Self {
        Self {
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            total_entries: counters.total_entries,
            total_size: counters.total_size,
            hit_rate: counters.hit_rate(),
            average_entry_size: counters.average_entry_size(),
            memory_usage: format_bytes(counters.total_size as u64),
        }
    }
}

// == Persistent Stats ==
/// Snapshot of the persistent tier.
#[derive(Debug, Clone, Serialize)]
pub struct PersistentStats {
    /// False when the storage failed its probe
    pub available: bool,
    /// Number of tracked keys
    pub total_entries: usize,
    /// Approximate bytes written, never decremented
    pub total_size: u64,
    /// Human-readable total size
    pub storage_usage: String,
    /// RFC 3339 time of the last cleanup, None if it never ran
    pub last_cleanup: Option<String>,
}

// == Service Stats ==
/// Merged report across both tiers.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub memory: MemoryStats,
    pub persistent: PersistentStats,
}

// == Formatting ==
const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Formats a byte count with 1024-based units and at most two decimals.
///
/// `0` formats as `"0 Bytes"`, `1536` as `"1.5 KB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
