//! API error type and its HTTP mapping
//!
//! Every error response has the shape `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::repository::RepositoryError;
use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Hint returned when the persistence layer itself is failing
pub const DATABASE_HINT: &str =
    "Database not initialized. Check that DATABASE_URL points to a writable database file";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input or missing content
    #[error("{0}")]
    Validation(String),
    /// Slug already taken
    #[error("This slug is already taken")]
    Conflict,
    #[error("Clip not found")]
    NotFound,
    /// Known slug whose expiration has passed
    #[error("Clip has expired")]
    Expired,
    #[error("Unauthorized")]
    Unauthorized,
    /// File could not be persisted
    #[error("{0}")]
    Storage(String),
    /// Persistence layer failure
    #[error("{0}")]
    Database(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Expired => StatusCode::GONE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Storage(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.0)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            too_large @ StorageError::TooLarge { .. } => ApiError::Validation(too_large.to_string()),
            other => ApiError::Storage(format!("Failed to store file: {other}")),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => ApiError::Conflict,
            RepositoryError::Serialization(e) => ApiError::Internal(format!("Corrupt clip record: {e}")),
            other => {
                tracing::error!(error = %other, "database failure");
                ApiError::Database(format!("{DATABASE_HINT} ({other})"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
