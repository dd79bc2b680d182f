//! HS256 JWT adapter for token verification.
//!
//! Implements the `TokenVerifier` port against the identity tokens the
//! platform's auth service issues. Tokens are symmetric HS256 JWTs whose
//! `sub` claim carries the user uid. Expiry is validated; everything else
//! the token carries is ignored here.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserUid;
use crate::ports::{TokenError, TokenVerifier};

/// JWT claims we care about. `sub` is the user uid.
#[derive(Debug, Serialize, Deserialize)]
struct IdentityClaims {
    sub: String,
    exp: i64,
}

/// Verifies HS256 identity tokens with a shared secret.
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    /// Creates a verifier from the shared HS256 secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserUid, TokenError> {
        let token_data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("identity token expired");
                        TokenError::Invalid("token expired".to_string())
                    }
                    _ => {
                        tracing::warn!("identity token rejected: {}", e);
                        TokenError::Invalid(e.to_string())
                    }
                }
            })?;

        let sub = token_data.claims.sub;
        if sub.is_empty() {
            tracing::warn!("identity token has empty subject");
            return Err(TokenError::Invalid("empty subject".to_string()));
        }

        Ok(UserUid::new(sub))
    }
}

impl std::fmt::Debug for JwtTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenVerifier").finish_non_exhaustive()
    }
}
