//! In-memory ConversationStore.
//!
//! Backs the integration tests and local development. A single lock over
//! the pair-key map gives the same atomicity the Postgres adapter gets
//! from its uniqueness constraint: concurrent find-or-create calls for
//! one pair converge on one entry.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::chat::Conversation;
use crate::domain::foundation::{ConversationId, Timestamp, UserUid};
use crate::ports::{ConversationStore, StoreError};

/// In-memory conversation store keyed by canonical pair key.
#[derive(Default)]
pub struct InMemoryConversationStore {
    inner: RwLock<HashMap<String, Conversation>>,
}

impl InMemoryConversationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn find_or_create(
        &self,
        a: &UserUid,
        b: &UserUid,
    ) -> Result<Conversation, StoreError> {
        let key = Conversation::pair_key(a, b);
        let mut inner = self.inner.write().await;
        let conversation = inner.entry(key).or_insert_with(|| Conversation {
            id: ConversationId::new(),
            participants: [a.clone(), b.clone()],
            last_message_text: None,
            last_message_at: None,
            unread_by_user: HashMap::new(),
            created_at: Timestamp::now(),
        });
        Ok(conversation.clone())
    }

    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.values().find(|c| c.id == id).cloned())
    }

    async fn list_for_user(
        &self,
        uid: &UserUid,
    ) -> Result<Vec<Conversation>, StoreError> {
        let inner = self.inner.read().await;
        let mut conversations: Vec<Conversation> = inner
            .values()
            .filter(|c| c.has_participant(uid))
            .cloned()
            .collect();
        conversations.sort_by(|x, y| {
            y.activity_at()
                .cmp(&x.activity_at())
                .then_with(|| x.id.cmp(&y.id))
        });
        Ok(conversations)
    }

    async fn record_message(
        &self,
        id: ConversationId,
        text: &str,
        at: Timestamp,
        unread_for: &UserUid,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let conversation = inner
            .values_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound {
                entity: "conversation",
            })?;
        conversation.last_message_text = Some(text.to_string());
        conversation.last_message_at = Some(at);
        *conversation
            .unread_by_user
            .entry(unread_for.clone())
            .or_insert(0) += 1;
        Ok(())
    }

    async fn reset_unread(
        &self,
        id: ConversationId,
        uid: &UserUid,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let conversation = inner
            .values_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound {
                entity: "conversation",
            })?;
        conversation.unread_by_user.insert(uid.clone(), 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_or_create_is_idempotent_across_argument_order() {
        let store = InMemoryConversationStore::new();
        let a = UserUid::new("a");
        let b = UserUid::new("b");

        let first = store.find_or_create(&a, &b).await.unwrap();
        let second = store.find_or_create(&b, &a).await.unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn record_message_increments_unread_and_denormalizes() {
        let store = InMemoryConversationStore::new();
        let a = UserUid::new("a");
        let b = UserUid::new("b");
        let conversation = store.find_or_create(&a, &b).await.unwrap();

        store
            .record_message(conversation.id, "hi", Timestamp::now(), &b)
            .await
            .unwrap();
        store
            .record_message(conversation.id, "again", Timestamp::now(), &b)
            .await
            .unwrap();

        let reloaded = store.find_by_id(conversation.id).await.unwrap().unwrap();
        assert_eq!(reloaded.unread_for(&b), 2);
        assert_eq!(reloaded.unread_for(&a), 0);
        assert_eq!(reloaded.last_message_text.as_deref(), Some("again"));
    }

    #[tokio::test]
    async fn record_message_on_missing_conversation_fails() {
        let store = InMemoryConversationStore::new();
        let result = store
            .record_message(
                ConversationId::new(),
                "hi",
                Timestamp::now(),
                &UserUid::new("b"),
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn list_orders_by_recent_activity() {
        let store = InMemoryConversationStore::new();
        let me = UserUid::new("me");

        let quiet = store
            .find_or_create(&me, &UserUid::new("quiet"))
            .await
            .unwrap();
        let busy = store
            .find_or_create(&me, &UserUid::new("busy"))
            .await
            .unwrap();
        store
            .record_message(busy.id, "hello", Timestamp::now(), &me)
            .await
            .unwrap();

        let listed = store.list_for_user(&me).await.unwrap();
        assert_eq!(listed[0].id, busy.id);
        assert_eq!(listed[1].id, quiet.id);
    }

    #[tokio::test]
    async fn reset_unread_on_missing_conversation_fails() {
        let store = InMemoryConversationStore::new();
        let result = store
            .reset_unread(ConversationId::new(), &UserUid::new("b"))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn reset_unread_is_idempotent() {
        let store = InMemoryConversationStore::new();
        let a = UserUid::new("a");
        let b = UserUid::new("b");
        let conversation = store.find_or_create(&a, &b).await.unwrap();

        store
            .record_message(conversation.id, "hi", Timestamp::now(), &b)
            .await
            .unwrap();
        store.reset_unread(conversation.id, &b).await.unwrap();
        store.reset_unread(conversation.id, &b).await.unwrap();

        let reloaded = store.find_by_id(conversation.id).await.unwrap().unwrap();
        assert_eq!(reloaded.unread_for(&b), 0);
    }
}
