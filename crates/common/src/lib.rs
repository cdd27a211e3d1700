// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between `postgate` clients and the server.
//! This module defines the JSON request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identifier assigned by the server
pub type Id = i64;

/// Body of `POST /api/users/register`
#[derive(Serialize, Deserialize, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Body of `POST /api/users/login`
#[derive(Serialize, Deserialize, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Plain acknowledgement, e.g. after registration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

/// Successful login
/// # Fields
/// * `message` - Human readable status
/// * `token` - Bearer token to send as `Authorization: Bearer <token>`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

/// Entry of the user directory returned by `GET /api/data`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Id,
    pub username: String,
    pub email: String,
}

/// Body of `POST /api/posts`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub content: String,
}

/// A stored post
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Id,
    pub username: String,
    pub content: String,
}

/// Error envelope for every non-2xx JSON response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_wire_shape() {
        let post = Post {
            id: 7,
            username: "alice".to_string(),
            content: "hi".to_string(),
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "id": 7, "username": "alice", "content": "hi" })
        );
    }

    #[test]
    fn test_register_request_missing_field_is_rejected() {
        let res = serde_json::from_str::<RegisterRequest>(r#"{"username":"a","password":"p"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let req = LoginRequest {
            username: "alice".to_string(),
            password: "secret1".to_string(),
        };
        let printed = format!("{req:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("secret1"));
    }
}
