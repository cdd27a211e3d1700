// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
/*! Stateless bearer tokens.

Tokens are compact HS256 JWTs: a JSON header, a JSON claims object and an
HMAC-SHA256 tag keyed with the shared secret. Nothing is stored server side;
a token stays valid until its `exp` claim (when present) passes or the secret
changes. */
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::JwtSecret;

/// Signing algorithm written to and required in every header
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claim carrying the authenticated account name
pub const USERNAME_CLAIM: &str = "username";

/// Decoded token payload
pub type Claims = Map<String, Value>;

/// Token errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token payload could not be decoded: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),

    #[error("token could not be encoded: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// Signs, verifies and decodes bearer tokens with one secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    unverified: Validation,
}

impl TokenService {
    pub fn new(secret: &JwtSecret) -> Self {
        Self::from_bytes(secret.expose().as_bytes())
    }

    pub fn from_bytes(key: &[u8]) -> Self {
        // exp and nbf are honoured only when the token carries them
        let mut validation = Validation::new(ALGORITHM);
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        let mut unverified = Validation::new(ALGORITHM);
        unverified.insecure_disable_signature_validation();
        unverified.required_spec_claims.clear();
        unverified.validate_exp = false;
        unverified.validate_nbf = false;
        unverified.validate_aud = false;

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            unverified,
        }
    }

    /// Sign a claims object
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Build and sign the claims for a freshly authenticated user.
    ///
    /// With `ttl_secs` set the token also carries `iat` and `exp`.
    pub fn issue_for(&self, username: &str, ttl_secs: Option<u64>) -> Result<String, TokenError> {
        let mut claims = Claims::new();
        claims.insert(USERNAME_CLAIM.to_string(), Value::from(username));

        if let Some(ttl) = ttl_secs {
            let now = Utc::now().timestamp();
            let ttl = i64::try_from(ttl).unwrap_or(i64::MAX);
            claims.insert("iat".to_string(), Value::from(now));
            claims.insert("exp".to_string(), Value::from(now.saturating_add(ttl)));
        }

        self.sign(&claims)
    }

    /// Check shape, encoding, algorithm, signature and time claims.
    ///
    /// Malformed input is an ordinary `false`, never an error.
    pub fn verify(&self, token: &str) -> bool {
        decode::<Claims>(token, &self.decoding, &self.validation).is_ok()
    }

    /// Return the claims without checking the signature.
    ///
    /// Only act on the result after [`TokenService::verify`] accepted the token.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.unverified)
            .map(|data| data.claims)
            .map_err(TokenError::Decode)
    }
}
