//! In-memory CommentStore.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::chat::Comment;
use crate::domain::foundation::{CommentId, PostId, Timestamp, UserUid};
use crate::ports::{CommentStore, StoreError};

/// In-memory comment store with an atomic id sequence, mirroring the
/// database sequence the Postgres adapter relies on.
#[derive(Default)]
pub struct InMemoryCommentStore {
    inner: RwLock<Vec<Comment>>,
    next_id: AtomicI64,
}

impl InMemoryCommentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn insert(
        &self,
        post_id: PostId,
        user_id: &UserUid,
        body: &str,
    ) -> Result<Comment, StoreError> {
        let id = CommentId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let comment = Comment {
            id,
            post_id,
            user_id: user_id.clone(),
            body: body.to_string(),
            created_at: Timestamp::now(),
        };
        self.inner.write().await.push(comment.clone());
        Ok(comment)
    }
}
