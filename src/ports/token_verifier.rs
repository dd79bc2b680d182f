//! Token verifier port.
//!
//! The REST side of the platform verifies identity tokens on every request.
//! The real-time core verifies once, when a connection identifies itself,
//! and binds the resulting uid to the connection; subsequent operations are
//! authorized against the bound identity rather than trusting
//! client-supplied uid fields.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::UserUid;

/// Errors produced by token verification.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    /// The token was malformed, expired, or failed signature checks.
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Port for verifying identity tokens issued by the auth collaborator.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verifies a token and extracts the identity it attests to.
    async fn verify(&self, token: &str) -> Result<UserUid, TokenError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_verifier_is_object_safe() {
        fn _accepts_dyn(_verifier: &dyn TokenVerifier) {}
    }
}
