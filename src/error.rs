//! Error types for the weather cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Error type for fallible cache internals and the HTTP surface.
///
/// Cache operations themselves never hand these to callers; they are
/// logged and degraded to a miss or a dropped write.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in any tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Value could not be serialized or deserialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// == Storage Error Enum ==
/// Failures reported by a key-value storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Storage is disabled or failed its probe
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Write would exceed the storage capacity
    #[error("Storage quota exceeded: {needed} bytes needed, {capacity} bytes available")]
    QuotaExceeded { needed: usize, capacity: usize },

    /// Underlying I/O failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing document could not be encoded or decoded
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Serialization(_) => StatusCode::BAD_REQUEST,
            CacheError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
