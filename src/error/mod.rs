//! Error handling module.
//!
//! Unified error handling with HTTP status code mapping and standardized API
//! error responses.

pub mod codes;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub use codes::ErrorCode;

use crate::engine::MintError;

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Setting failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidSetting(String),

    /// Minting engine failure.
    #[error(transparent)]
    Mint(#[from] MintError),

    /// Authentication failed.
    #[error("Authentication failed")]
    Unauthorized,

    /// Insufficient permissions.
    #[error("Insufficient permissions")]
    Forbidden,

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidSetting(_)
            | Self::Mint(MintError::InvalidConfiguration(_) | MintError::ArithmeticOverflow) => {
                ErrorCode::INVALID_CONFIG
            }
            Self::Mint(MintError::NotEnoughPermutations { .. }) => {
                ErrorCode::NOT_ENOUGH_PERMUTATIONS
            }
            Self::Mint(MintError::Decode(_)) => ErrorCode::INVALID_PARAM,
            Self::Unauthorized => ErrorCode::UNAUTHORIZED,
            Self::Forbidden => ErrorCode::FORBIDDEN,
            Self::BadRequest(_) => ErrorCode::BAD_REQUEST,
            Self::NotFound(_) => ErrorCode::NOT_FOUND,
            Self::Storage(_) => ErrorCode::STORAGE_ERROR,
            Self::Internal(_) => ErrorCode::INTERNAL_ERROR,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidSetting(_) | Self::Mint(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().as_i32();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_code = code,
                status = %status,
                message = %message,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error_code = code,
                status = %status,
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "code": code,
            "message": message,
            "data": null
        }));

        (status, body).into_response()
    }
}

/// Storage-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Optimistic lock conflict.
    #[error("Concurrent modification detected")]
    ConcurrentModification,

    /// Lock acquisition failed.
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// Lock timeout.
    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::InvalidSetting("test".to_string()).error_code(),
            ErrorCode::INVALID_CONFIG
        );
        assert_eq!(
            AppError::Mint(MintError::NotEnoughPermutations {
                remaining: 2,
                requested: 3
            })
            .error_code(),
            ErrorCode::NOT_ENOUGH_PERMUTATIONS
        );
        assert_eq!(
            AppError::Mint(MintError::Decode("x".to_string())).error_code(),
            ErrorCode::INVALID_PARAM
        );
        assert_eq!(AppError::Unauthorized.error_code(), ErrorCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Storage(StorageError::Unavailable).error_code(),
            ErrorCode::STORAGE_ERROR
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Mint(MintError::ArithmeticOverflow).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_mint_message_is_transparent() {
        let err = AppError::from(MintError::NotEnoughPermutations {
            remaining: 2,
            requested: 3,
        });
        assert_eq!(
            err.to_string(),
            "3 ids were requested but only 2 can be created using given format"
        );
    }
}
