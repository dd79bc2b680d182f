//! Comment store port.

use async_trait::async_trait;

use crate::domain::chat::Comment;
use crate::domain::foundation::{PostId, UserUid};

use super::StoreError;

/// Repository port for post comments.
///
/// The store owns identity assignment: ids come from an atomic sequence so
/// concurrent inserts can never collide (this replaces the legacy
/// read-max-then-increment scheme and its race window).
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Persists a new comment and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// `Database` on persistence failure.
    async fn insert(
        &self,
        post_id: PostId,
        user_id: &UserUid,
        body: &str,
    ) -> Result<Comment, StoreError>;
}
