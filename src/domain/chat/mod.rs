//! Chat domain entities: conversations, messages, comments, profiles.

mod comment;
mod conversation;
mod message;
mod profile;

pub use comment::Comment;
pub use conversation::Conversation;
pub use message::ChatMessage;
pub use profile::ProfileSummary;
