//! Application layer: services orchestrating ports and the registry.

mod chat_service;
mod comment_service;

pub use chat_service::{ChatService, ConversationSummary};
pub use comment_service::CommentService;
