//! Cache Entry Module
//!
//! Defines the memory-tier entry and the unit stored by the persistent tier.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A single memory-tier entry with its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The entry's own key
    pub key: String,
    /// The cached payload
    pub data: V,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Time-to-live in milliseconds
    pub ttl: u64,
    /// Serialized size of `data` in bytes, fixed at insertion
    pub size: usize,
    /// Number of successful reads
    pub hits: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(key: String, data: V, ttl: Duration, size: usize) -> Self {
        Self {
            key,
            data,
            timestamp: current_timestamp_ms(),
            ttl: duration_to_ms(ttl),
            size,
            hits: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL.
    ///
    /// An entry expires once strictly more than `ttl` milliseconds have
    /// passed since creation.
    pub fn is_expired(&self) -> bool {
        is_expired_at(self.timestamp, self.ttl, current_timestamp_ms())
    }

    /// Returns the TTL left before expiry.
    pub fn ttl_remaining(&self) -> Duration {
        remaining(self.timestamp, self.ttl, current_timestamp_ms())
    }
}

// == Stored Entry ==
/// Unit written to persistent storage under one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// The cached payload
    pub data: Value,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Time-to-live in milliseconds
    pub ttl: u64,
}

impl StoredEntry {
    /// Creates a stored unit stamped with the current time.
    pub fn new(data: Value, ttl: Duration) -> Self {
        Self {
            data,
            timestamp: current_timestamp_ms(),
            ttl: duration_to_ms(ttl),
        }
    }

    /// Checks if the stored unit has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        is_expired_at(self.timestamp, self.ttl, current_timestamp_ms())
    }

    /// Returns the TTL left before expiry.
    pub fn ttl_remaining(&self) -> Duration {
        remaining(self.timestamp, self.ttl, current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn is_expired_at(timestamp: u64, ttl: u64, now: u64) -> bool {
    now.saturating_sub(timestamp) > ttl
}

fn remaining(timestamp: u64, ttl: u64, now: u64) -> Duration {
    let age = now.saturating_sub(timestamp);
    Duration::from_millis(ttl.saturating_sub(age))
}

fn duration_to_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("k".to_string(), 5u32, Duration::from_secs(60), 1);

        assert_eq!(entry.key, "k");
        assert_eq!(entry.data, 5);
        assert_eq!(entry.ttl, 60_000);
        assert_eq!(entry.hits, 0);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("k".to_string(), (), Duration::from_millis(50), 0);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(120));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        // Age equal to the TTL is still live; only strictly older expires
        assert!(!is_expired_at(1_000, 500, 1_500));
        assert!(is_expired_at(1_000, 500, 1_501));
    }

    #[test]
    fn test_clock_skew_is_not_expiry() {
        // A timestamp from the future (another writer's clock) reads as age 0
        assert!(!is_expired_at(2_000, 0, 1_000));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = StoredEntry::new(json!(1), Duration::from_secs(10));

        let remaining = entry.ttl_remaining();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_stored_entry_wire_format() {
        let entry = StoredEntry {
            data: json!({"temp": 21.5}),
            timestamp: 1_700_000_000_000,
            ttl: 600_000,
        };

        let raw = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            raw,
            r#"{"data":{"temp":21.5},"timestamp":1700000000000,"ttl":600000}"#
        );
    }
}
