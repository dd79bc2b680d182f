//! WebSocket wire protocol for the real-time core.
//!
//! JSON text frames, `type`-tagged. Operation names and payload field
//! spellings match what the deployed clients already emit (a mix of
//! camelCase and snake_case; the comment flow is snake_case throughout).
//!
//! Request/acknowledgment calls carry a client-chosen `requestId` echoed on
//! the ack envelope (`{ok: true, ...}` / `{ok: false, error, code}`).
//! Room joins and `markConversationRead` are fire-and-forget: no ack.
//!
//! # Client reconciliation contract
//!
//! - Every `message` / `new_comment` event carries the full entity, so a
//!   client may replace-or-append by identity.
//! - Clients must de-duplicate by entity id: a history fetch may race a
//!   live broadcast for the same entity after reconnect-and-rejoin.
//! - An `{ok: false}` ack must roll back any optimistic local state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::chat::{ChatMessage, Comment};
use crate::domain::foundation::{ChatError, ConversationId, PostId, UserUid};

// ============================================
// Client → Server Requests
// ============================================

/// All request types a client may send over the socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Binds a verified identity to this connection. Must precede any
    /// identity-requiring operation.
    #[serde(rename = "identify")]
    Identify {
        token: String,
        #[serde(rename = "requestId", default)]
        request_id: Option<String>,
    },

    /// Joins the broadcast room for a post's comments. No ack.
    #[serde(rename = "join_post")]
    JoinPost {
        #[serde(rename = "postId")]
        post_id: PostId,
    },

    /// Persists a comment and fans it out to the post room. No ack; the
    /// creator only sees the comment if it joined the room first.
    #[serde(rename = "new_comment")]
    NewComment {
        post_id: PostId,
        user_id: UserUid,
        body: String,
    },

    /// Joins the broadcast room for a conversation. No ack.
    #[serde(rename = "joinConversation")]
    JoinConversation {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
        #[serde(rename = "userUid")]
        user_uid: UserUid,
    },

    /// Lists the requesting user's conversations, most recent first.
    #[serde(rename = "getConversations")]
    GetConversations {
        #[serde(rename = "userUid")]
        user_uid: UserUid,
        #[serde(rename = "requestId", default)]
        request_id: Option<String>,
    },

    /// Full message history for a conversation, ascending.
    #[serde(rename = "getMessages")]
    GetMessages {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
        #[serde(rename = "requestId", default)]
        request_id: Option<String>,
    },

    /// Persists and broadcasts a message, then acks with the entity.
    #[serde(rename = "sendMessage")]
    SendMessage {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
        #[serde(rename = "senderUid")]
        sender_uid: UserUid,
        text: String,
        #[serde(rename = "requestId", default)]
        request_id: Option<String>,
    },

    /// Resets the caller's unread counter. Side effect only, no ack.
    #[serde(rename = "markConversationRead")]
    MarkConversationRead {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
        #[serde(rename = "userUid")]
        user_uid: UserUid,
    },

    /// Idempotent find-or-create of the conversation between two users.
    #[serde(rename = "startConversation")]
    StartConversation {
        #[serde(rename = "currentUserUid")]
        current_user_uid: UserUid,
        #[serde(rename = "otherUserUid")]
        other_user_uid: UserUid,
        #[serde(rename = "requestId", default)]
        request_id: Option<String>,
    },
}

// ============================================
// Server → Client Events
// ============================================

/// Everything the server pushes down a connection: acks for
/// request/acknowledgment calls, plus room broadcasts.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Acknowledgment envelope for a request.
    #[serde(rename = "ack")]
    Ack(Ack),

    /// A new message in a conversation room. Carries the full entity.
    #[serde(rename = "message")]
    Message {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
        message: ChatMessage,
    },

    /// A new comment in a post room. Carries the full entity.
    #[serde(rename = "new_comment")]
    NewComment(Comment),
}

/// Uniform acknowledgment envelope: `{ok: true, ...data}` or
/// `{ok: false, error, code}`.
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    pub ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,

    /// Operation-specific success payload, flattened into the envelope
    /// (e.g. `{"message": {...}}`, `{"conversations": [...]}`).
    #[serde(flatten)]
    pub data: Option<Value>,
}

impl Ack {
    /// Success ack with an operation-specific payload.
    pub fn ok(request_id: Option<String>, data: Value) -> ServerEvent {
        ServerEvent::Ack(Self {
            request_id,
            ok: true,
            error: None,
            code: None,
            data: Some(data),
        })
    }

    /// Failure ack carrying the error message and its stable code.
    pub fn err(request_id: Option<String>, err: &ChatError) -> ServerEvent {
        ServerEvent::Ack(Self {
            request_id,
            ok: false,
            error: Some(err.to_string()),
            code: Some(err.code()),
            data: None,
        })
    }
}
