//! PostgreSQL implementation of MessageStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserUid};
use crate::ports::{MessageStore, StoreError};

/// PostgreSQL implementation of MessageStore.
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Creates a new PostgresMessageStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn insert(&self, message: &ChatMessage) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO messages (
                id, conversation_id, sender_uid, recipient_uid, text, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.sender_uid.as_str())
        .bind(message.recipient_uid.as_str())
        .bind(&message.text)
        .bind(message.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert message: {}", e)))?;

        Ok(())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_uid, recipient_uid, text, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch messages: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                let conversation_id: Uuid = row.get("conversation_id");
                let sender_uid: String = row.get("sender_uid");
                let recipient_uid: String = row.get("recipient_uid");
                let text: String = row.get("text");
                let created_at: DateTime<Utc> = row.get("created_at");

                ChatMessage {
                    id: MessageId::from_uuid(id),
                    conversation_id: ConversationId::from_uuid(conversation_id),
                    sender_uid: UserUid::new(sender_uid),
                    recipient_uid: UserUid::new(recipient_uid),
                    text,
                    created_at: Timestamp::from_datetime(created_at),
                }
            })
            .collect())
    }
}
