//! API Handlers
//!
//! HTTP request handlers for each cache sidecar endpoint.

use axum::{
    extract::{Query, State},
    http::Uri,
    Json,
};
use serde_json::Value;

use crate::cache::{
    generate_geocoding_key, generate_weather_key, CacheService, ServiceStats, SharedCacheService,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CleanupResponse, GeocodingKeyQuery, GetResponse, HealthResponse, KeyResponse,
    MessageResponse, SetRequest, WeatherKeyQuery,
};

/// Application state shared across all handlers.
///
/// Holds the one cache service of the process behind `Arc<RwLock<>>`.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCacheService,
}

impl AppState {
    /// Creates a new AppState around the given service.
    pub fn new(cache: CacheService) -> Self {
        Self {
            cache: cache.into_shared(),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheService::from_config(config))
    }
}

/// Handler for PUT /cache
///
/// Stores a JSON value in the tiers the request selects.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<MessageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let options = req.options();
    state.cache.write().await.set(&req.key, &req.value, options);

    Ok(Json(MessageResponse::stored(&req.key)))
}

/// Extracts the key from a `/cache/<key>` request path without percent-decoding.
///
/// Geocoding keys are already percent-encoded, so the segment is taken as sent:
/// `/cache/geocoding_new%20york` addresses the key `geocoding_new%20york`.
fn raw_cache_key(uri: &Uri) -> Result<String> {
    uri.path()
        .strip_prefix("/cache/")
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CacheError::InvalidRequest("Key cannot be empty".to_string()))
}

/// Handler for GET /cache/:key
///
/// Looks the key up in memory, then in the persistent tier.
pub async fn get_handler(State(state): State<AppState>, uri: Uri) -> Result<Json<GetResponse>> {
    let key = raw_cache_key(&uri)?;
    // Write lock: reads update counters and may promote
    let value = state.cache.write().await.get::<Value>(&key);

    match value {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<MessageResponse>> {
    let key = raw_cache_key(&uri)?;
    state.cache.write().await.delete(&key);
    Ok(Json(MessageResponse::deleted(&key)))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.write().await.clear();
    Json(MessageResponse::cleared())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<ServiceStats> {
    Json(state.cache.read().await.stats())
}

/// Handler for POST /cleanup
///
/// Runs a persistent sweep now instead of waiting for the next interval.
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<CleanupResponse> {
    let removed = state.cache.write().await.cleanup();
    Json(CleanupResponse { removed })
}

/// Handler for GET /keys/weather?lat=..&lng=..&type=..
pub async fn weather_key_handler(
    Query(query): Query<WeatherKeyQuery>,
) -> Result<Json<KeyResponse>> {
    if !query.lat.is_finite() || !query.lng.is_finite() {
        return Err(CacheError::InvalidRequest(
            "Coordinates must be finite numbers".to_string(),
        ));
    }

    Ok(Json(KeyResponse {
        key: generate_weather_key(query.lat, query.lng, &query.kind),
    }))
}

/// Handler for GET /keys/geocoding?q=..
pub async fn geocoding_key_handler(
    Query(query): Query<GeocodingKeyQuery>,
) -> Result<Json<KeyResponse>> {
    if query.q.trim().is_empty() {
        return Err(CacheError::InvalidRequest("Query cannot be empty".to_string()));
    }

    Ok(Json(KeyResponse {
        key: generate_geocoding_key(&query.q),
    }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::new(CacheService::new(
            &Config::default(),
            Box::new(MemoryStorage::new()),
        ))
    }

    fn set_request(json: Value) -> SetRequest {
        serde_json::from_value(json).unwrap()
    }

    fn cache_uri(key: &str) -> Uri {
        format!("/cache/{}", key).parse().unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = set_request(json!({"key": "test_key", "value": {"temp": 21}}));
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let response = get_handler(State(state), cache_uri("test_key"))
            .await
            .unwrap();
        assert_eq!(response.value, json!({"temp": 21}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), cache_uri("nonexistent")).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        let req = set_request(json!({"key": "to_delete", "value": 1, "persistent": true}));
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        delete_handler(State(state.clone()), cache_uri("to_delete"))
            .await
            .unwrap();

        let result = get_handler(State(state), cache_uri("to_delete")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_clear_and_stats_handler() {
        let state = test_state();
        let req = set_request(json!({"key": "a", "value": 1}));
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let stats = stats_handler(State(state.clone())).await;
        assert_eq!(stats.memory.total_entries, 1);

        clear_handler(State(state.clone())).await;

        let stats = stats_handler(State(state)).await;
        assert_eq!(stats.memory.total_entries, 0);
    }

    #[tokio::test]
    async fn test_cleanup_handler() {
        let state = test_state();

        let response = cleanup_handler(State(state)).await;
        assert_eq!(response.removed, 0);
    }

    #[tokio::test]
    async fn test_key_handlers() {
        let weather = weather_key_handler(Query(WeatherKeyQuery {
            lat: 48.85661,
            lng: 2.35222,
            kind: "forecast".to_string(),
        }))
        .await
        .unwrap();
        assert_eq!(weather.key, "weather_forecast_48.8566_2.3522");

        let geocoding = geocoding_key_handler(Query(GeocodingKeyQuery {
            q: "New York".to_string(),
        }))
        .await
        .unwrap();
        assert_eq!(geocoding.key, "geocoding_new%20york");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();

        let req = set_request(json!({"key": "", "value": 1}));
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn test_raw_cache_key_keeps_percent_encoding() {
        let key = raw_cache_key(&cache_uri("geocoding_new%20york")).unwrap();
        assert_eq!(key, "geocoding_new%20york");
    }

    #[test]
    fn test_raw_cache_key_empty() {
        let result = raw_cache_key(&"/cache/".parse().unwrap());
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_get_handler_encoded_geocoding_key() {
        let state = test_state();
        let key = generate_geocoding_key("New York");

        let req = set_request(json!({"key": key, "value": 1}));
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let response = get_handler(State(state), cache_uri(&key)).await.unwrap();
        assert_eq!(response.key, "geocoding_new%20york");
    }
}
