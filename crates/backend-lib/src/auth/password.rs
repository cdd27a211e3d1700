// ============================
// postgate-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::HashingSettings;

/// Errors raised while producing a hash. Never used for "wrong password".
#[derive(Error, Debug)]
pub enum HashError {
    #[error("invalid scrypt parameters: {0}")]
    Params(#[from] scrypt::errors::InvalidParams),

    #[error("{0}")]
    Hash(#[from] scrypt::password_hash::Error),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Salted scrypt hasher.
///
/// Cost parameters are fixed when the hasher is built from configuration.
/// Verification reads the parameters embedded in the stored PHC string.
#[derive(Clone, Copy, Debug)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(settings: &HashingSettings) -> Result<Self, HashError> {
        Ok(Self {
            params: settings.to_params()?,
        })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params, &salt)?
            .to_string();
        Ok(hash)
    }

    /// Verify a password against a stored hash. Malformed hashes verify as false.
    pub fn verify(plain: &str, stored: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }

    /// Hash on the blocking pool; the plaintext is wiped once hashed
    pub async fn hash_async(&self, plain: Zeroizing<String>) -> Result<String, HashError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    /// Verify on the blocking pool; the plaintext is wiped afterwards
    pub async fn verify_async(plain: Zeroizing<String>, stored: String) -> bool {
        match tokio::task::spawn_blocking(move || Self::verify(&plain, &stored)).await {
            Ok(ok) => ok,
            Err(err) => {
                tracing::error!(error = %err, "password verification task failed");
                false
            },
        }
    }
}
