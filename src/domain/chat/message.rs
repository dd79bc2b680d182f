//! Chat message entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserUid};

/// A single message inside a 1:1 conversation.
///
/// Immutable once created; never updated or deleted by the core. Broadcast
/// events always carry the full entity so clients can replace-or-append by
/// `id` when a history fetch races a live push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identity, unique across all conversations.
    #[serde(rename = "_id")]
    pub id: MessageId,

    /// The conversation this message belongs to.
    pub conversation_id: ConversationId,

    /// Uid of the sending participant.
    pub sender_uid: UserUid,

    /// Uid of the other participant.
    pub recipient_uid: UserUid,

    /// Message body. Non-empty after trimming; validated by the service
    /// before construction.
    pub text: String,

    /// Server-side creation time. History ordering key.
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
}

impl ChatMessage {
    /// Creates a new message with a fresh identity and the current time.
    pub fn new(
        conversation_id: ConversationId,
        sender_uid: UserUid,
        recipient_uid: UserUid,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            sender_uid,
            recipient_uid,
            text: text.into(),
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_wire_field_names() {
        let msg = ChatMessage::new(
            ConversationId::new(),
            UserUid::new("sender"),
            UserUid::new("recipient"),
            "hello",
        );

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""_id":"#));
        assert!(json.contains(r#""conversation_id":"#));
        assert!(json.contains(r#""sender_uid":"sender""#));
        assert!(json.contains(r#""recipient_uid":"recipient""#));
        assert!(json.contains(r#""createdAt":"#));
    }

    #[test]
    fn new_messages_get_distinct_ids() {
        let conversation = ConversationId::new();
        let a = ChatMessage::new(conversation, "a".into(), "b".into(), "one");
        let b = ChatMessage::new(conversation, "a".into(), "b".into(), "two");
        assert_ne!(a.id, b.id);
    }
}
