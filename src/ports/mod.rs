//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! real-time core and the outside world. Adapters implement these ports.
//!
//! - [`ConversationStore`] - durable conversation documents + unread counters
//! - [`MessageStore`] - durable message inserts and history queries
//! - [`CommentStore`] - durable comment inserts with sequence-assigned ids
//! - [`ProfileReader`] - read-only access to public profile summaries
//! - [`TokenVerifier`] - connect-time identity token verification

mod comment_store;
mod conversation_store;
mod message_store;
mod profile_reader;
mod token_verifier;

pub use comment_store::CommentStore;
pub use conversation_store::ConversationStore;
pub use message_store::MessageStore;
pub use profile_reader::ProfileReader;
pub use token_verifier::{TokenError, TokenVerifier};

use thiserror::Error;

use crate::domain::foundation::ChatError;

/// Errors surfaced by the persistence adapters.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The underlying database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(String),

    /// A row that must exist was missing.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A persisted row could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        ChatError::Persistence(err.to_string())
    }
}
