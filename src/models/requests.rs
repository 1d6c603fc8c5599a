//! Request DTOs for the cache sidecar API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{SetOptions, DEFAULT_WEATHER_KIND};

/// Request body for the SET operation (PUT /cache)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses the service default if not specified)
/// - `persistent`: Also write to the persistent tier (default: false)
/// - `memory`: Write to the memory tier (default: true)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default = "default_true")]
    pub memory: bool,
}

fn default_true() -> bool {
    true
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if !self.memory && !self.persistent {
            return Some("At least one of memory or persistent must be true".to_string());
        }
        None
    }

    /// Tier and TTL selection carried by the request.
    pub fn options(&self) -> SetOptions {
        let options = SetOptions::default()
            .persistent(self.persistent)
            .memory(self.memory);
        match self.ttl {
            Some(secs) => options.with_ttl(Duration::from_secs(secs)),
            None => options,
        }
    }
}

/// Query string for GET /keys/weather
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherKeyQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type", default = "default_weather_kind")]
    pub kind: String,
}

fn default_weather_kind() -> String {
    DEFAULT_WEATHER_KIND.to_string()
}

/// Query string for GET /keys/geocoding
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingKeyQuery {
    pub q: String,
}
