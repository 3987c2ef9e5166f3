//! Error types for the cache engine
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
/// Unified error type for stores, wrappers and the HTTP front-end.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent or expired. Expected in normal traffic.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Bad construction parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The circuit breaker guarding a store is open
    #[error("Circuit breaker is open")]
    CircuitOpen,

    /// Opaque error raised by a backing store
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    /// Wraps a backend-specific error.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        CacheError::Backend(err.into())
    }

    /// Returns true for the expected "key not found" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Backend(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
