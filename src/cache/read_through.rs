//! Read-through access over the shared service.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{SetOptions, SharedCacheService};

/// Returns the cached value for `key`, or fetches, stores and returns it.
///
/// The service lock is released while `fetch` runs. A fetch error is
/// returned as-is and nothing is cached.
///
/// # Example
/// ```ignore
/// let key = generate_geocoding_key("Paris");
/// let place: Place = get_or_fetch(&cache, &key, options, || geocode("Paris")).await?;
/// ```
pub async fn get_or_fetch<T, E, F, Fut>(
    cache: &SharedCacheService,
    key: &str,
    options: SetOptions,
    fetch: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let cached = cache.write().await.get::<T>(key);
    if let Some(value) = cached {
        debug!(key, "read-through: cache hit");
        return Ok(value);
    }

    debug!(key, "read-through: cache miss, fetching");
    let value = fetch().await?;
    cache.write().await.set(key, &value, options);
    Ok(value)
}
