//! Error types for the bounded store
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error Enum ==
/// Unified error type for the bounded store and its HTTP surface.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key not found in the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key is empty, too long, or collides with the reserved index key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Store constructed with unusable parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A stored envelope could not be parsed
    #[error("Invalid value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// The index and the data it describes have drifted apart
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Read, write or remove failure from the underlying mechanism
    #[error("Storage mechanism failure: {0}")]
    Mechanism(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Builds an `InvalidValue` error for `key`.
    pub fn invalid_value(key: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::InvalidValue {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::InvalidKey(_) | StoreError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            StoreError::InvalidValue { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::Mechanism(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::InvalidConfig(_)
            | StoreError::ContractViolation(_)
            | StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the bounded store.
pub type Result<T> = std::result::Result<T, StoreError>;
