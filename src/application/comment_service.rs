//! Comment broadcast service: the simpler persist-then-broadcast flow for
//! post comments.

use std::sync::Arc;

use crate::adapters::websocket::{ConnectionId, ConnectionRegistry, RoomId, ServerEvent};
use crate::domain::chat::Comment;
use crate::domain::foundation::{ChatError, PostId, UserUid};
use crate::ports::CommentStore;

/// Persists comments and fans them out to post rooms.
///
/// There is no ack-only path: the creator receives its own comment solely
/// via the room broadcast, so a client that wants the echo must join
/// `post:<postId>` before commenting.
pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    registry: Arc<ConnectionRegistry>,
}

impl CommentService {
    /// Creates the service over the comment store and the registry.
    pub fn new(comments: Arc<dyn CommentStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { comments, registry }
    }

    /// Joins a connection to a post's comment room.
    pub async fn join_post(&self, connection_id: ConnectionId, post_id: PostId) {
        self.registry
            .join(connection_id, RoomId::Post(post_id))
            .await;
    }

    /// Persists a comment with a sequence-assigned id, then broadcasts the
    /// full entity to `post:<postId>` as `new_comment`.
    ///
    /// # Errors
    ///
    /// - `EmptyMessage` if the body is empty after trimming
    /// - `Persistence` if the insert fails (nothing is broadcast)
    pub async fn new_comment(
        &self,
        post_id: PostId,
        user_id: &UserUid,
        body: &str,
    ) -> Result<Comment, ChatError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let comment = self.comments.insert(post_id, user_id, body).await?;

        tracing::info!(
            post_id = %post_id,
            comment_id = %comment.id,
            user_uid = %user_id,
            "comment persisted"
        );

        self.registry
            .broadcast(RoomId::Post(post_id), ServerEvent::NewComment(comment.clone()))
            .await;

        Ok(comment)
    }
}
