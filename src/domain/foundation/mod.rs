//! Foundation value objects shared across the domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ChatError;
pub use ids::{CommentId, ConversationId, MessageId, PostId, UserUid};
pub use timestamp::Timestamp;
