//! Error taxonomy for the real-time core.
//!
//! Every request/acknowledgment operation resolves to either a success
//! payload or one of these errors; the WebSocket layer maps the error to a
//! stable string code inside the `{ok: false, error, code}` ack envelope.
//! A failed operation never drops the connection.

use thiserror::Error;

use super::{ConversationId, UserUid};

/// Errors produced by the conversation and comment services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Message text is empty after trimming.
    #[error("message text cannot be empty")]
    EmptyMessage,

    /// A user attempted to start a conversation with themselves.
    #[error("cannot start a conversation with yourself")]
    InvalidParticipant,

    /// The acting user is not a participant of the conversation, or a
    /// client-supplied uid does not match the identity bound to the
    /// connection.
    #[error("operation not permitted for this user")]
    Forbidden,

    /// An identity-requiring operation arrived before `identify`.
    #[error("no identity bound to this connection")]
    NotIdentified,

    /// The referenced conversation does not exist.
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    /// The referenced user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserUid),

    /// The identity token could not be verified.
    #[error("identity token rejected: {0}")]
    InvalidToken(String),

    /// The durable store failed; the operation had no effect.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ChatError {
    /// Stable machine-readable code for the ack envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::EmptyMessage => "EMPTY_MESSAGE",
            ChatError::InvalidParticipant => "INVALID_PARTICIPANT",
            ChatError::Forbidden => "FORBIDDEN",
            ChatError::NotIdentified => "NOT_IDENTIFIED",
            ChatError::ConversationNotFound(_) => "CONVERSATION_NOT_FOUND",
            ChatError::UserNotFound(_) => "USER_NOT_FOUND",
            ChatError::InvalidToken(_) => "INVALID_TOKEN",
            ChatError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}
