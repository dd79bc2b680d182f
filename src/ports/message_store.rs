//! Message store port.

use async_trait::async_trait;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::ConversationId;

use super::StoreError;

/// Repository port for durable message persistence.
///
/// Messages are append-only; the core never updates or deletes them.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists a new message.
    ///
    /// # Errors
    ///
    /// `Database` on persistence failure. The caller must treat a failure
    /// as "message does not exist": no broadcast, no success ack.
    async fn insert(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Full message history for a conversation, ascending by creation time
    /// (message id breaks ties deterministically).
    ///
    /// No pagination; acceptable at this scope, noted as a scalability
    /// limitation.
    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ChatMessage>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn MessageStore) {}
    }
}
