// ============================
// postgate-backend-lib/src/router.rs
// ============================
//! HTTP router: routes, CORS and request tracing.
use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{self, posts, users};
use crate::storage::Storage;
use crate::AppState;

/// Create the API router
pub fn create_router<S: Storage + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/users/register", post(users::register::<S>))
        .route("/api/users/login", post(users::login::<S>))
        .route("/api/data", get(users::list_users::<S>))
        .route(
            "/api/posts",
            get(posts::list_posts::<S>).post(posts::create_post::<S>),
        )
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
