//! Configuration Module
//!
//! Handles loading cache limits, TTLs and sidecar settings from environment
//! variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// == Defaults ==
const DEFAULT_MAX_ENTRIES: usize = 100;
const DEFAULT_MAX_MEMORY_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_CLEANUP_INTERVAL: u64 = 60 * 60;
const DEFAULT_SERVER_PORT: u16 = 3000;

// == Cache Category ==
/// Kinds of data the weather app caches, each with its own default TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCategory {
    WeatherCurrent,
    WeatherForecast,
    Geocoding,
    LocationSearch,
    UserPreferences,
}

// == Cache TTLs ==
/// Default time-to-live per data category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTtls {
    pub weather_current: Duration,
    pub weather_forecast: Duration,
    pub geocoding: Duration,
    pub location_search: Duration,
    pub user_preferences: Duration,
}

impl CacheTtls {
    /// Returns the configured TTL for a category.
    pub fn for_category(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::WeatherCurrent => self.weather_current,
            CacheCategory::WeatherForecast => self.weather_forecast,
            CacheCategory::Geocoding => self.geocoding,
            CacheCategory::LocationSearch => self.location_search,
            CacheCategory::UserPreferences => self.user_preferences,
        }
    }

    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            weather_current: env_secs("CACHE_TTL_WEATHER_CURRENT", defaults.weather_current),
            weather_forecast: env_secs("CACHE_TTL_WEATHER_FORECAST", defaults.weather_forecast),
            geocoding: env_secs("CACHE_TTL_GEOCODING", defaults.geocoding),
            location_search: env_secs("CACHE_TTL_LOCATION_SEARCH", defaults.location_search),
            user_preferences: env_secs("CACHE_TTL_USER_PREFERENCES", defaults.user_preferences),
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            weather_current: Duration::from_secs(10 * 60),
            weather_forecast: Duration::from_secs(30 * 60),
            geocoding: Duration::from_secs(24 * 60 * 60),
            location_search: Duration::from_secs(60 * 60),
            user_preferences: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// Cache and sidecar configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries in the memory tier
    pub max_entries: usize,
    /// Maximum estimated bytes held by the memory tier
    pub max_memory_bytes: usize,
    /// Default TTL per data category
    pub ttls: CacheTtls,
    /// Persistent tier cleanup interval in seconds
    pub cleanup_interval: u64,
    /// Backing file for the persistent tier, None = in-process storage
    pub storage_path: Option<PathBuf>,
    /// Capacity of the persistent storage in bytes
    pub storage_quota_bytes: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Memory tier entry ceiling (default: 100)
    /// - `CACHE_MAX_MEMORY_BYTES` - Memory tier size ceiling (default: 10 MiB)
    /// - `CACHE_TTL_*` - Per-category TTLs in seconds
    /// - `CACHE_CLEANUP_INTERVAL` - Persistent cleanup frequency in seconds (default: 3600)
    /// - `CACHE_STORAGE_PATH` - Persistent storage file (default: unset, in-process)
    /// - `CACHE_STORAGE_QUOTA_BYTES` - Persistent storage capacity (default: 5 MiB)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        Self {
            max_entries: env_or("CACHE_MAX_ENTRIES", DEFAULT_MAX_ENTRIES),
            max_memory_bytes: env_or("CACHE_MAX_MEMORY_BYTES", DEFAULT_MAX_MEMORY_BYTES),
            ttls: CacheTtls::from_env(),
            cleanup_interval: env_or("CACHE_CLEANUP_INTERVAL", DEFAULT_CLEANUP_INTERVAL),
            storage_path: env::var("CACHE_STORAGE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            storage_quota_bytes: env_or("CACHE_STORAGE_QUOTA_BYTES", DEFAULT_STORAGE_QUOTA_BYTES),
            server_port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT),
        }
    }

    /// TTL applied when a caller does not pick one.
    pub fn default_ttl(&self) -> Duration {
        self.ttls.weather_current
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
            ttls: CacheTtls::default(),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            storage_path: None,
            storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
