//! Test utilities for the API integration tests
//!
//! Builds a router over flat-file storage in a temporary directory, with a
//! cheap scrypt cost so hashing does not dominate test time.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use backend_lib::{
    config::{HashingSettings, Settings},
    router::create_router,
    storage::FlatFileStorage,
    AppState,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_ORIGIN: &str = "https://app.example.test";

/// Router plus the state and directory behind it
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState<FlatFileStorage>>,
    /// Keep in scope to prevent cleanup during the test
    pub dir: TempDir,
}

/// Response pieces the tests look at
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response body is UTF-8")
    }
}

pub fn test_settings(dir: &TempDir) -> Settings {
    Settings::builder()
        .data_dir(dir.path().to_path_buf())
        .jwt_secret(TEST_SECRET)
        .allowed_origin(TEST_ORIGIN.to_string())
        .password_hashing(HashingSettings { log_n: 4, r: 8, p: 1 })
        .build()
        .expect("test settings are valid")
}

/// Sets up a fresh app over an empty temporary data directory
pub fn setup_test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);
    setup_with_settings(dir, settings)
}

pub fn setup_with_settings(dir: TempDir, settings: Settings) -> TestApp {
    let storage = FlatFileStorage::new(dir.path()).unwrap();
    let state = Arc::new(AppState::new(storage, settings).expect("state builds"));
    let router = create_router(state.clone());
    TestApp { router, state, dir }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> TestResponse {
        self.post_json(
            "/api/users/register",
            None,
            serde_json::json!({ "username": username, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_json(
            "/api/users/login",
            None,
            serde_json::json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Register and log in, returning the bearer token
    pub async fn token_for(&self, username: &str, password: &str) -> String {
        let email = format!("{username}@example.com");
        assert_eq!(self.register(username, &email, password).await.status, StatusCode::CREATED);
        let res = self.login(username, password).await;
        assert_eq!(res.status, StatusCode::OK);
        res.json()["token"].as_str().unwrap().to_string()
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
