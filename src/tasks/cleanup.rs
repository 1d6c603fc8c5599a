//! Persistent Cleanup Task
//!
//! Background task that sweeps stale entries out of the persistent tier:
//! once at startup, then at a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::SharedCacheService;

/// Spawns a background task that periodically cleans up the persistent tier.
///
/// The first sweep runs immediately; later sweeps run every `interval`.
/// The task loops for as long as the runtime lives and holds the service
/// write lock only for the duration of one sweep.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = CacheService::from_config(&config).into_shared();
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(3600));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: SharedCacheService, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting persistent cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // First tick completes immediately
            ticker.tick().await;

            let removed = cache.write().await.cleanup();

            if removed > 0 {
                info!("Persistent cleanup: removed {} stale entries", removed);
            } else {
                debug!("Persistent cleanup: no stale entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheService, SetOptions};
    use crate::config::Config;
    use crate::storage::{KeyValueStorage, MemoryStorage};
    use serde_json::json;

    fn shared_over(storage: &MemoryStorage) -> SharedCacheService {
        CacheService::new(&Config::default(), Box::new(storage.clone())).into_shared()
    }

    #[tokio::test]
    async fn test_cleanup_runs_immediately_at_startup() {
        let storage = MemoryStorage::new();
        let cache = shared_over(&storage);
        cache.write().await.set(
            "expire_soon",
            &json!("value"),
            SetOptions::default()
                .with_ttl(Duration::from_millis(20))
                .persistent(true)
                .memory(false),
        );
        tokio::time::sleep(Duration::from_millis(60)).await;

        // Interval far longer than the test: only the startup sweep can run
        let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let service = cache.read().await;
        assert!(service.persistent().keys().is_empty());
        assert!(service.stats().persistent.last_cleanup.is_some());
        drop(service);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_repeats_on_interval() {
        let storage = MemoryStorage::new();
        let cache = shared_over(&storage);
        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(100));

        // Written after the startup sweep has run
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.write().await.set(
            "expire_soon",
            &json!("value"),
            SetOptions::default()
                .with_ttl(Duration::from_millis(20))
                .persistent(true)
                .memory(false),
        );

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(cache.read().await.persistent().keys().is_empty());
        assert!(storage
            .get_item("weather_cache:expire_soon")
            .unwrap()
            .is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_preserves_valid_entries() {
        let storage = MemoryStorage::new();
        let cache = shared_over(&storage);
        cache.write().await.set(
            "long_lived",
            &json!("value"),
            SetOptions::default()
                .with_ttl(Duration::from_secs(3600))
                .persistent(true),
        );

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(150)).await;

        let mut service = cache.write().await;
        assert_eq!(service.persistent().keys(), &["long_lived".to_string()]);
        assert_eq!(service.get::<String>("long_lived"), Some("value".to_string()));
        drop(service);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = shared_over(&MemoryStorage::new());

        let handle = spawn_cleanup_task(cache, Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
