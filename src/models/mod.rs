//! Models Module
//!
//! Request and response DTOs for the cache sidecar API.

pub mod requests;
pub mod responses;

pub use requests::{GeocodingKeyQuery, SetRequest, WeatherKeyQuery};
pub use responses::{CleanupResponse, GetResponse, HealthResponse, KeyResponse, MessageResponse};
