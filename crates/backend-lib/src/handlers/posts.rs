// ============================
// crates/backend-lib/src/handlers/posts.rs
// ============================
//! Post creation and listing. Both routes sit behind the gate.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use metrics::counter;
use postgate_common::{NewPost, Post};

use super::malformed_body;
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::metrics::POST_CREATED;
use crate::storage::Storage;
use crate::validation::validate_post;
use crate::AppState;

/// `POST /api/posts`: the author is always the authenticated user
#[tracing::instrument(skip_all, fields(username = %user.username))]
pub async fn create_post<S: Storage + 'static>(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<NewPost>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let Json(new_post) = body.map_err(malformed_body)?;
    validate_post(&new_post)?;

    let post = state
        .storage
        .insert_post(&user.username, &new_post.content)
        .await?;

    counter!(POST_CREATED).increment(1);
    tracing::info!(id = post.id, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /api/posts`: newest first
#[tracing::instrument(skip_all, fields(username = %user.username))]
pub async fn list_posts<S: Storage + 'static>(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Post>>, AppError> {
    let posts = state.storage.list_posts().await?;
    tracing::debug!(count = posts.len(), "listed posts");
    Ok(Json(posts))
}
