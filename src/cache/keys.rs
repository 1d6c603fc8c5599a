//! Cache key construction for weather and geocoding lookups.

/// Weather kind used when the caller does not name one.
pub const DEFAULT_WEATHER_KIND: &str = "current";

/// Builds the key for a weather lookup at a coordinate.
///
/// Coordinates are rounded to four decimals (about 11 m), so nearby
/// lookups share one entry: `weather_<kind>_<lat>_<lng>`.
pub fn generate_weather_key(lat: f64, lng: f64, kind: &str) -> String {
    format!("weather_{}_{:.4}_{:.4}", kind, lat, lng)
}

/// Builds the key for a geocoding query.
///
/// The query is lowercased and percent-encoded, so queries differing only
/// in case share one entry.
pub fn generate_geocoding_key(query: &str) -> String {
    format!("geocoding_{}", urlencoding::encode(&query.to_lowercase()))
}
