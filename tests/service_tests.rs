//! Integration Tests for the Cache Service
//!
//! Exercises the two tiers together over shared storage, the way several
//! processes share one persistent store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use serde_json::{json, Value};
use weather_cache::cache::{generate_geocoding_key, generate_weather_key};
use weather_cache::error::StorageError;
use weather_cache::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use weather_cache::{CacheCategory, CacheService, Config, SetOptions};

// == Helper Types ==

/// Storage wrapper counting reads, to observe which tier served a `get`.
struct CountingStorage {
    inner: MemoryStorage,
    reads: Arc<AtomicUsize>,
}

impl KeyValueStorage for CountingStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove_item(key)
    }
}

fn service_over(storage: &MemoryStorage) -> CacheService {
    CacheService::new(&Config::default(), Box::new(storage.clone()))
}

fn small_config(max_entries: usize) -> Config {
    Config {
        max_entries,
        ..Config::default()
    }
}

// == Scenarios ==

#[test]
fn test_persistent_value_promoted_after_restart() {
    let storage = MemoryStorage::new();
    let mut first = service_over(&storage);
    first.set(
        "k",
        &json!({"temp": 18.5}),
        SetOptions::default().persistent(true).memory(false),
    );
    drop(first);

    // Fresh memory tier over the same storage
    let reads = Arc::new(AtomicUsize::new(0));
    let mut service = CacheService::new(
        &Config::default(),
        Box::new(CountingStorage {
            inner: storage.clone(),
            reads: reads.clone(),
        }),
    );
    let baseline = reads.load(Ordering::SeqCst);

    assert_eq!(service.get::<Value>("k"), Some(json!({"temp": 18.5})));
    let after_promotion = reads.load(Ordering::SeqCst);
    assert!(after_promotion > baseline, "first read must reach storage");

    assert_eq!(service.get::<Value>("k"), Some(json!({"temp": 18.5})));
    assert_eq!(
        reads.load(Ordering::SeqCst),
        after_promotion,
        "second read must be served from memory"
    );
    assert_eq!(service.stats().memory.hits, 1);
}

#[test]
fn test_count_ceiling_keeps_two_newest() {
    let mut service = CacheService::new(&small_config(2), Box::new(MemoryStorage::new()));

    service.set("first", &1, SetOptions::default());
    service.set("second", &2, SetOptions::default());
    service.set("third", &3, SetOptions::default());

    assert_eq!(service.get::<i32>("first"), None);
    assert_eq!(service.get::<i32>("second"), Some(2));
    assert_eq!(service.get::<i32>("third"), Some(3));
    assert_eq!(service.stats().memory.evictions, 1);
}

#[test]
fn test_evicted_memory_entry_still_served_from_persistent() {
    let mut service = CacheService::new(&small_config(1), Box::new(MemoryStorage::new()));

    service.set("a", &"alpha", SetOptions::default().persistent(true));
    service.set("b", &"beta", SetOptions::default());

    assert_eq!(service.get::<String>("a"), Some("alpha".to_string()));
}

#[test]
fn test_expiry_in_both_tiers() {
    let storage = MemoryStorage::new();
    let mut service = service_over(&storage);
    service.set(
        "k",
        &json!(1),
        SetOptions::default()
            .with_ttl(Duration::from_millis(50))
            .persistent(true),
    );

    sleep(Duration::from_millis(120));

    assert_eq!(service.get::<Value>("k"), None);
    assert_eq!(service.get::<Value>("k"), None);
    assert!(service.persistent().keys().is_empty());
    assert!(storage.get_item("weather_cache:k").unwrap().is_none());
}

#[test]
fn test_category_ttls_drive_writes() {
    let mut service = service_over(&MemoryStorage::new());
    let key = generate_geocoding_key("New York");

    let options = service.options_for(CacheCategory::Geocoding).persistent(true);
    service.set(&key, &json!({"lat": 40.7128, "lng": -74.006}), options);

    assert_eq!(key, "geocoding_new%20york");
    assert!(service.get::<Value>(&generate_geocoding_key("NEW YORK")).is_some());
}

#[test]
fn test_weather_key_buckets_nearby_coordinates() {
    let mut service = service_over(&MemoryStorage::new());

    service.set(
        &generate_weather_key(48.85661, 2.35222, "forecast"),
        &json!(["sunny", "rain"]),
        SetOptions::default(),
    );

    let nearby = generate_weather_key(48.85659, 2.35218, "forecast");
    assert_eq!(nearby, "weather_forecast_48.8566_2.3522");
    assert_eq!(
        service.get::<Vec<String>>(&nearby),
        Some(vec!["sunny".to_string(), "rain".to_string()])
    );
}

#[test]
fn test_quota_exceeded_degrades_to_memory_only() {
    let mut service = CacheService::new(
        &Config::default(),
        Box::new(MemoryStorage::with_quota(256)),
    );

    service.set(
        "big",
        &"x".repeat(1024),
        SetOptions::default().persistent(true),
    );

    assert!(service.persistent().keys().is_empty());
    assert_eq!(service.get::<String>("big"), Some("x".repeat(1024)));
}

#[test]
fn test_file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        storage_path: Some(dir.path().join("cache.json")),
        ..Config::default()
    };

    {
        let mut service = CacheService::from_config(&config);
        service.set(
            "geocoding_paris",
            &json!({"lat": 48.8566, "lng": 2.3522}),
            SetOptions::default().persistent(true),
        );
    }

    let mut service = CacheService::from_config(&config);
    assert_eq!(service.stats().persistent.total_entries, 1);
    assert_eq!(
        service.get::<Value>("geocoding_paris"),
        Some(json!({"lat": 48.8566, "lng": 2.3522}))
    );

    let storage = FileStorage::open(dir.path().join("cache.json"), usize::MAX).unwrap();
    assert!(storage
        .get_item("weather_cache:geocoding_paris")
        .unwrap()
        .is_some());
}

#[test]
fn test_cleanup_reclaims_unread_entries() {
    let storage = MemoryStorage::new();
    let mut service = service_over(&storage);
    for i in 0..5 {
        service.set(
            &format!("short_{}", i),
            &i,
            SetOptions::default()
                .with_ttl(Duration::from_millis(30))
                .persistent(true)
                .memory(false),
        );
    }
    service.set("long", &99, SetOptions::default().persistent(true));

    sleep(Duration::from_millis(80));

    assert_eq!(service.cleanup(), 5);
    assert_eq!(service.persistent().keys(), &["long".to_string()]);
}
