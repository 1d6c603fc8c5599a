//! API Module
//!
//! HTTP handlers and routing for the cache sidecar REST API.
//!
//! # Endpoints
//! - `PUT /cache` - Store a JSON value
//! - `GET /cache/:key` - Retrieve a value by key
//! - `DELETE /cache/:key` - Delete a key from both tiers
//! - `DELETE /cache` - Clear both tiers
//! - `GET /stats` - Merged cache statistics
//! - `POST /cleanup` - Sweep stale persistent entries
//! - `GET /keys/weather` - Build a weather cache key
//! - `GET /keys/geocoding` - Build a geocoding cache key
//! - `GET /health` - Health check endpoint
//!
//! The `:key` segment is used exactly as sent, without percent-decoding, so
//! keys from `/keys/geocoding` can be put in the path unchanged.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
