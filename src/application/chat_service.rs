//! Conversation service: the request/acknowledgment operations of the
//! messaging core.
//!
//! Every mutating operation persists first and broadcasts second; a
//! persistence failure prevents both the broadcast and the success ack.

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::websocket::{ConnectionId, ConnectionRegistry, RoomId, ServerEvent};
use crate::domain::chat::{ChatMessage, Conversation, ProfileSummary};
use crate::domain::foundation::{ChatError, ConversationId, Timestamp, UserUid};
use crate::ports::{ConversationStore, MessageStore, ProfileReader};

/// One row of a `getConversations` response: the conversation's listing
/// fields, the other participant's public profile, and the requesting
/// user's own unread counter.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    #[serde(rename = "_id")]
    pub id: ConversationId,

    #[serde(rename = "lastMessageText")]
    pub last_message_text: Option<String>,

    #[serde(rename = "lastMessageAt")]
    pub last_message_at: Option<Timestamp>,

    pub unread_count: i64,

    #[serde(rename = "otherUser")]
    pub other_user: ProfileSummary,
}

/// Orchestrates conversation persistence, unread accounting, and room
/// fan-out.
pub struct ChatService {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    profiles: Arc<dyn ProfileReader>,
    registry: Arc<ConnectionRegistry>,
}

impl ChatService {
    /// Creates the service over its ports and the live-connection registry.
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        profiles: Arc<dyn ProfileReader>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            conversations,
            messages,
            profiles,
            registry,
        }
    }

    /// Lists `uid`'s conversations, most recently active first, each
    /// enriched with the other participant's profile summary and `uid`'s
    /// own unread counter.
    pub async fn get_conversations(
        &self,
        uid: &UserUid,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let conversations = self.conversations.list_for_user(uid).await?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let other = conversation
                .other_participant(uid)
                .ok_or(ChatError::Forbidden)?
                .clone();
            let profile = self
                .profiles
                .profile(&other)
                .await?
                .unwrap_or_else(|| ProfileSummary::bare(other));

            summaries.push(ConversationSummary {
                id: conversation.id,
                last_message_text: conversation.last_message_text.clone(),
                last_message_at: conversation.last_message_at,
                unread_count: conversation.unread_for(uid),
                other_user: profile,
            });
        }
        Ok(summaries)
    }

    /// Finds or creates the conversation between two users.
    ///
    /// Idempotent under concurrent callers: the store enforces uniqueness
    /// on the unordered pair, so at most one document ever exists.
    ///
    /// # Errors
    ///
    /// `InvalidParticipant` if both uids are the same user.
    pub async fn start_conversation(
        &self,
        current: &UserUid,
        other: &UserUid,
    ) -> Result<Conversation, ChatError> {
        if current == other {
            return Err(ChatError::InvalidParticipant);
        }
        let conversation = self.conversations.find_or_create(current, other).await?;
        tracing::info!(
            conversation_id = %conversation.id,
            user_uid = %current,
            "conversation started"
        );
        Ok(conversation)
    }

    /// Joins a connection to a conversation room.
    ///
    /// # Errors
    ///
    /// - `ConversationNotFound` if the conversation does not exist
    /// - `Forbidden` if `uid` is not a participant
    pub async fn join_conversation(
        &self,
        connection_id: ConnectionId,
        conversation_id: ConversationId,
        uid: &UserUid,
    ) -> Result<(), ChatError> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;
        if !conversation.has_participant(uid) {
            return Err(ChatError::Forbidden);
        }
        self.registry
            .join(connection_id, RoomId::Conversation(conversation_id))
            .await;
        Ok(())
    }

    /// Full message history, ascending by creation time.
    ///
    /// Idempotent read with no side effects; safe to retry.
    pub async fn get_messages(
        &self,
        conversation_id: ConversationId,
        requester: &UserUid,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;
        if !conversation.has_participant(requester) {
            return Err(ChatError::Forbidden);
        }
        Ok(self.messages.list_by_conversation(conversation_id).await?)
    }

    /// Persists a message, updates the conversation's denormalized
    /// last-message fields, increments the other participant's unread
    /// counter, broadcasts the full entity to the conversation room, and
    /// returns it for the ack.
    ///
    /// # Errors
    ///
    /// - `EmptyMessage` if the text is empty after trimming
    /// - `ConversationNotFound` / `Forbidden` on bad targets
    /// - `Persistence` if any write fails (nothing is broadcast)
    pub async fn send_message(
        &self,
        conversation_id: ConversationId,
        sender: &UserUid,
        text: &str,
    ) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;
        let recipient = conversation
            .other_participant(sender)
            .ok_or(ChatError::Forbidden)?
            .clone();

        let message =
            ChatMessage::new(conversation_id, sender.clone(), recipient.clone(), text);

        self.messages.insert(&message).await?;
        self.conversations
            .record_message(conversation_id, &message.text, message.created_at, &recipient)
            .await?;

        tracing::info!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            sender_uid = %sender,
            "message persisted"
        );

        self.registry
            .broadcast(
                RoomId::Conversation(conversation_id),
                ServerEvent::Message {
                    conversation_id,
                    message: message.clone(),
                },
            )
            .await;

        Ok(message)
    }

    /// Resets `uid`'s unread counter for the conversation to zero.
    ///
    /// Idempotent, purely per-user read state; no broadcast.
    pub async fn mark_conversation_read(
        &self,
        conversation_id: ConversationId,
        uid: &UserUid,
    ) -> Result<(), ChatError> {
        self.conversations
            .reset_unread(conversation_id, uid)
            .await?;
        Ok(())
    }
}
