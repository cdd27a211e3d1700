// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.

pub mod posts;
pub mod users;

use axum::{extract::rejection::JsonRejection, http::StatusCode};

use crate::error::AppError;
use crate::validation::ValidationError;

/// Plain-text greeting served at `/`
pub async fn index() -> &'static str {
    "Welcome to the postgate API"
}

/// Plain-text 404 for unknown paths and methods
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Map a body extraction failure to a validation error
pub(crate) fn malformed_body(rejection: JsonRejection) -> AppError {
    AppError::Validation(ValidationError::MalformedBody(rejection.body_text()))
}
