// ============================
// postgate-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{authorize, AuthenticatedUser, RejectReason, BEARER_PREFIX};
pub use password::{CredentialHasher, HashError};
pub use token::{Claims, TokenError, TokenService, USERNAME_CLAIM};
