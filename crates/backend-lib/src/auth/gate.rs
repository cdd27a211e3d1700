// ============================
// crates/backend-lib/src/auth/gate.rs
// ============================
//! Bearer-token authorization for protected routes.
//!
//! Every protected handler takes [`AuthenticatedUser`] as an argument, so the
//! gate runs before the body is read and before storage is touched.
use std::fmt;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
};
use metrics::counter;
use serde_json::Value;

use super::token::{TokenService, USERNAME_CLAIM};
use crate::error::AppError;
use crate::metrics::GATE_REJECTED;
use crate::storage::Storage;
use crate::AppState;

/// Authorization scheme prefix, including the separating space
pub const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was turned away. Logged, never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingHeader,
    WrongScheme,
    EmptyToken,
    InvalidToken,
    MissingUsernameClaim,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::MissingHeader => "missing authorization header",
            RejectReason::WrongScheme => "authorization scheme is not bearer",
            RejectReason::EmptyToken => "empty bearer token",
            RejectReason::InvalidToken => "invalid token",
            RejectReason::MissingUsernameClaim => "missing username claim",
        };
        f.write_str(text)
    }
}

/// Identity established by a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Run the gate over a raw `Authorization` header value
pub fn authorize(
    header: Option<&HeaderValue>,
    tokens: &TokenService,
) -> Result<AuthenticatedUser, RejectReason> {
    let header = header.ok_or(RejectReason::MissingHeader)?;
    let header = header.to_str().map_err(|_| RejectReason::WrongScheme)?;

    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(RejectReason::WrongScheme)?;
    if token.is_empty() {
        return Err(RejectReason::EmptyToken);
    }

    if !tokens.verify(token) {
        return Err(RejectReason::InvalidToken);
    }

    // verify accepted the payload, so decoding cannot disagree with it
    let claims = tokens.decode(token).map_err(|_| RejectReason::InvalidToken)?;
    match claims.get(USERNAME_CLAIM).and_then(Value::as_str) {
        Some(username) if !username.is_empty() => Ok(AuthenticatedUser {
            username: username.to_string(),
        }),
        _ => Err(RejectReason::MissingUsernameClaim),
    }
}

impl<S> FromRequestParts<Arc<AppState<S>>> for AuthenticatedUser
where
    S: Storage + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        match authorize(parts.headers.get(AUTHORIZATION), &state.tokens) {
            Ok(user) => Ok(user),
            Err(reason) => {
                counter!(GATE_REJECTED, "reason" => reason.to_string()).increment(1);
                tracing::warn!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    %reason,
                    "rejected unauthenticated request"
                );
                Err(AppError::Unauthorized(reason))
            },
        }
    }
}
