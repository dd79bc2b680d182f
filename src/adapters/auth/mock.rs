//! Mock token verifier for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::UserUid;
use crate::ports::{TokenError, TokenVerifier};

/// Verifier that accepts only tokens registered up front.
#[derive(Default)]
pub struct MockTokenVerifier {
    tokens: RwLock<HashMap<String, UserUid>>,
}

impl MockTokenVerifier {
    /// Creates a verifier that rejects everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token as attesting to the given uid.
    pub async fn accept(&self, token: impl Into<String>, uid: UserUid) {
        self.tokens.write().await.insert(token.into(), uid);
    }
}

#[async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserUid, TokenError> {
        self.tokens
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| TokenError::Invalid("unknown token".to_string()))
    }
}
