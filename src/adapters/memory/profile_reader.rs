//! In-memory ProfileReader.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::chat::ProfileSummary;
use crate::domain::foundation::UserUid;
use crate::ports::{ProfileReader, StoreError};

/// In-memory profile table, seeded by tests.
#[derive(Default)]
pub struct InMemoryProfileReader {
    inner: RwLock<HashMap<UserUid, ProfileSummary>>,
}

impl InMemoryProfileReader {
    /// Creates an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a profile row.
    pub async fn upsert(&self, profile: ProfileSummary) {
        self.inner
            .write()
            .await
            .insert(profile.uid.clone(), profile);
    }
}

#[async_trait]
impl ProfileReader for InMemoryProfileReader {
    async fn profile(&self, uid: &UserUid) -> Result<Option<ProfileSummary>, StoreError> {
        Ok(self.inner.read().await.get(uid).cloned())
    }
}
