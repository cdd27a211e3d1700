// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! Registration, login and the user directory.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use metrics::counter;
use postgate_common::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest, UserSummary};
use zeroize::Zeroizing;

use super::malformed_body;
use crate::auth::{AuthenticatedUser, CredentialHasher};
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, USER_REGISTERED};
use crate::storage::{NewUser, Storage};
use crate::validation::validate_registration;
use crate::AppState;

/// `POST /api/users/register`
///
/// Validates the body, hashes the password on the blocking pool and inserts
/// the account. A taken username is a 409, not a 500.
#[tracing::instrument(skip_all, fields(username = tracing::field::Empty))]
pub async fn register<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let Json(req) = body.map_err(malformed_body)?;
    tracing::Span::current().record("username", req.username.as_str());
    validate_registration(&req)?;

    let RegisterRequest {
        username,
        email,
        password,
    } = req;
    let password_hash = state.hasher.hash_async(Zeroizing::new(password)).await?;

    let id = state
        .storage
        .insert_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    counter!(USER_REGISTERED).increment(1);
    tracing::info!(id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// `POST /api/users/login`
///
/// Unknown usernames and wrong passwords produce the same response, and an
/// unknown username still pays for one verification against the decoy hash.
#[tracing::instrument(skip_all, fields(username = tracing::field::Empty))]
pub async fn login<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(LoginRequest { username, password }) = body.map_err(malformed_body)?;
    tracing::Span::current().record("username", username.as_str());
    let password = Zeroizing::new(password);

    let user = state.storage.find_user_by_username(&username).await?;
    let verified = match user {
        Some(user) => CredentialHasher::verify_async(password, user.password_hash).await,
        None => {
            let _ = CredentialHasher::verify_async(password, state.decoy_hash().to_string()).await;
            false
        },
    };

    if !verified {
        counter!(LOGIN_FAILED).increment(1);
        tracing::info!("login failed");
        return Err(AppError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue_for(&username, state.settings.token_ttl_secs)?;

    counter!(LOGIN_SUCCEEDED).increment(1);
    tracing::info!("user logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}

/// `GET /api/data`: the user directory, without password hashes
#[tracing::instrument(skip_all, fields(username = %user.username))]
pub async fn list_users<S: Storage + 'static>(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = state.storage.list_users().await?;
    tracing::debug!(count = users.len(), "listed users");
    Ok(Json(users))
}
