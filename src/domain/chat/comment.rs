//! Post comment entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CommentId, PostId, Timestamp, UserUid};

/// A flat (unthreaded) comment on an artwork post.
///
/// Independent of the conversation model. The numeric id is assigned by the
/// persistence adapter from an atomic sequence, not computed by reading the
/// current maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Sequence-assigned comment identity.
    pub id: CommentId,

    /// The post this comment belongs to.
    pub post_id: PostId,

    /// Uid of the comment author.
    pub user_id: UserUid,

    /// Comment body.
    pub body: String,

    /// Server-side creation time.
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
}
