// ============================
// postgate-backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the `postgate` API server.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;

use crate::auth::{CredentialHasher, TokenService};
use crate::config::Settings;
use crate::storage::FlatFileStorage;

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Storage backend
    pub storage: S,
    /// Token signing and verification
    pub tokens: TokenService,
    /// Password hasher built from the configured cost
    pub hasher: CredentialHasher,
    /// Settings
    pub settings: Settings,
    /// CORS origin, parsed once
    pub allowed_origin: HeaderValue,
    /// Verified against when a login names an unknown user
    decoy_hash: String,
}

impl<S> AppState<S> {
    /// Create a new application state
    pub fn new(storage: S, settings: Settings) -> anyhow::Result<Self> {
        settings.validate()?;

        let tokens = TokenService::new(&settings.jwt_secret);
        let hasher = CredentialHasher::new(&settings.password_hashing)?;
        let allowed_origin = HeaderValue::from_str(&settings.allowed_origin)
            .context("allowed_origin is not a valid header value")?;
        let decoy_hash = hasher
            .hash("postgate decoy credential")
            .context("failed to compute decoy hash")?;

        Ok(Self {
            storage,
            tokens,
            hasher,
            settings,
            allowed_origin,
            decoy_hash,
        })
    }

    /// Hash used to equalise login timing for unknown usernames
    pub fn decoy_hash(&self) -> &str {
        &self.decoy_hash
    }
}

impl AppState<FlatFileStorage> {
    /// Create application state backed by flat files under `settings.data_dir`
    pub fn with_flat_files(settings: Settings) -> anyhow::Result<Arc<Self>> {
        let storage = FlatFileStorage::new(&settings.data_dir)
            .with_context(|| format!("failed to open storage at {}", settings.data_dir.display()))?;
        Ok(Arc::new(Self::new(storage, settings)?))
    }
}
