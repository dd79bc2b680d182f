//! In-memory MessageStore.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::ConversationId;
use crate::ports::{MessageStore, StoreError};

/// Append-only in-memory message log.
#[derive(Default)]
pub struct InMemoryMessageStore {
    inner: RwLock<Vec<ChatMessage>>,
}

impl InMemoryMessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, message: &ChatMessage) -> Result<(), StoreError> {
        self.inner.write().await.push(message.clone());
        Ok(())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.read().await;
        let mut messages: Vec<ChatMessage> = inner
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for identical timestamps.
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserUid;

    #[tokio::test]
    async fn history_is_scoped_and_ascending() {
        let store = InMemoryMessageStore::new();
        let conversation = ConversationId::new();
        let other = ConversationId::new();

        let first = ChatMessage::new(conversation, "a".into(), "b".into(), "one");
        let second = ChatMessage::new(conversation, "b".into(), "a".into(), "two");
        let noise = ChatMessage::new(other, "c".into(), "d".into(), "elsewhere");

        store.insert(&first).await.unwrap();
        store.insert(&noise).await.unwrap();
        store.insert(&second).await.unwrap();

        let history = store.list_by_conversation(conversation).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, first.id);
        assert_eq!(history[1].id, second.id);
        assert!(history.iter().all(|m| m.sender_uid != UserUid::new("c")));
    }
}
