//! Authentication behaviour observed through the HTTP surface.

mod test_utils;

use axum::http::StatusCode;
use backend_lib::{auth::{Claims, TokenService}, config::JwtSecret, storage::Storage};
use serde_json::{json, Value};
use tempfile::TempDir;
use test_utils::{setup_test_app, setup_with_settings, test_settings};

fn claims(value: Value) -> Claims {
    match value {
        Value::Object(map) => map,
        _ => panic!("claims must be an object"),
    }
}

#[tokio::test]
async fn test_login_does_not_reveal_unknown_users() {
    let app = setup_test_app();
    app.register("alice", "a@x.com", "secret1").await;

    let unknown = app.login("nobody", "secret1").await;
    let wrong_password = app.login("alice", "wrong").await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body, wrong_password.body);
    assert_eq!(
        unknown.json(),
        json!({ "error": "Invalid username or password" })
    );
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let app = setup_test_app();

    assert_eq!(
        app.register("alice", "a@x.com", "secret1").await.status,
        StatusCode::CREATED
    );
    let res = app.register("alice", "other@x.com", "secret2").await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.json(), json!({ "error": "Username already exists" }));

    // the original password still works
    assert_eq!(app.login("alice", "secret1").await.status, StatusCode::OK);
    assert_eq!(app.login("alice", "secret2").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let app = setup_test_app();
    app.register("alice", "a@x.com", "secret1").await;

    let user = app
        .state
        .storage
        .find_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(user.password_hash, "secret1");
    assert!(user.password_hash.starts_with("$scrypt$"));

    let log = std::fs::read_to_string(app.dir.path().join("users.log")).unwrap();
    assert!(!log.contains("secret1"));
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let app = setup_test_app();
    app.register("alice", "a@x.com", "secret1").await;

    let foreign = TokenService::new(&JwtSecret::new("some-other-secret"))
        .issue_for("alice", None)
        .unwrap();
    let res = app.get("/api/posts", Some(&foreign)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let app = setup_test_app();
    let token = app.token_for("alice", "secret1").await;

    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let forged_claims = app
        .state
        .tokens
        .sign(&claims(json!({ "username": "mallory" })))
        .unwrap();
    // forged payload with alice's signature
    parts[1] = forged_claims.split('.').nth(1).unwrap().to_string();

    let res = app.get("/api/posts", Some(&parts.join("."))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_without_username_rejected() {
    let app = setup_test_app();
    let token = app
        .state
        .tokens
        .sign(&claims(json!({ "sub": "alice" })))
        .unwrap();

    let res = app.get("/api/data", Some(&token)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json(), json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = setup_test_app();
    let expired = app
        .state
        .tokens
        .sign(&claims(json!({ "username": "alice", "exp": 1_000 })))
        .unwrap();

    let res = app.get("/api/posts", Some(&expired)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tokens_carry_no_expiry_by_default() {
    let app = setup_test_app();
    let token = app.token_for("alice", "secret1").await;

    let decoded = app.state.tokens.decode(&token).unwrap();
    assert_eq!(decoded, claims(json!({ "username": "alice" })));
}

#[tokio::test]
async fn test_configured_ttl_adds_expiry() {
    let dir = TempDir::new().unwrap();
    let mut settings = test_settings(&dir);
    settings.token_ttl_secs = Some(120);
    let app = setup_with_settings(dir, settings);

    let token = app.token_for("alice", "secret1").await;
    let decoded = app.state.tokens.decode(&token).unwrap();
    let exp = decoded["exp"].as_i64().unwrap();
    let iat = decoded["iat"].as_i64().unwrap();
    assert_eq!(exp - iat, 120);

    assert_eq!(app.get("/api/posts", Some(&token)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_accounts_survive_restart() {
    let app = setup_test_app();
    app.register("alice", "a@x.com", "secret1").await;

    let dir = app.dir;
    let settings = test_settings(&dir);
    let restarted = setup_with_settings(dir, settings);

    let res = restarted.login("alice", "secret1").await;
    assert_eq!(res.status, StatusCode::OK);
}
