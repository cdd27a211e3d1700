// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use postgate_common::ErrorResponse;
use thiserror::Error;

use crate::auth::{HashError, RejectReason, TokenError};
use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Body message shared by every gate rejection
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Body message shared by every failed login
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unauthorized: {0}")]
    Unauthorized(RejectReason),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists: {0}")]
    Conflict(String),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] HashError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Hash(_) | AppError::Token(_) | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error, used in logs
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::Unauthorized(_) => "AUTH_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::Conflict(_) => "USER_001",
            AppError::Hash(_) => "HASH_001",
            AppError::Token(_) => "TOKEN_001",
            AppError::Storage(_) => "STORE_001",
        }
    }

    /// Message placed in the response body.
    ///
    /// Gate rejections and login failures never reveal their cause. Internal
    /// errors carry the raw message in debug builds only.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(_) => self.to_string(),
            AppError::Unauthorized(_) => UNAUTHORIZED_MESSAGE.to_string(),
            AppError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AppError::Conflict(_) => "Username already exists".to_string(),
            _ if cfg!(debug_assertions) => self.to_string(),
            _ => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UsernameTaken(username) => AppError::Conflict(username),
            other => AppError::Storage(other),
        }
    }
}
