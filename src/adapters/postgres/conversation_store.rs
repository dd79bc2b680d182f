//! PostgreSQL implementation of ConversationStore.
//!
//! Conversation rows carry a unique `pair_key` column; insertion races for
//! the same pair collapse onto one row via `ON CONFLICT DO NOTHING`.
//! Unread counters live in a separate `conversation_unread` table and are
//! incremented with an upsert so concurrent senders never lose updates.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::chat::Conversation;
use crate::domain::foundation::{ConversationId, Timestamp, UserUid};
use crate::ports::{ConversationStore, StoreError};

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    /// Creates a new PostgresConversationStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn unread_counters(
        &self,
        conversation_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, HashMap<UserUid, i64>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT conversation_id, user_uid, count
            FROM conversation_unread
            WHERE conversation_id = ANY($1)
            "#,
        )
        .bind(conversation_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to fetch unread counters: {}", e))
        })?;

        let mut counters: HashMap<Uuid, HashMap<UserUid, i64>> = HashMap::new();
        for row in rows {
            let conversation_id: Uuid = row.get("conversation_id");
            let user_uid: String = row.get("user_uid");
            let count: i64 = row.get("count");
            counters
                .entry(conversation_id)
                .or_default()
                .insert(UserUid::new(user_uid), count);
        }
        Ok(counters)
    }

    fn row_to_conversation(
        row: &sqlx::postgres::PgRow,
        unread_by_user: HashMap<UserUid, i64>,
    ) -> Conversation {
        let id: Uuid = row.get("id");
        let participant_a: String = row.get("participant_a");
        let participant_b: String = row.get("participant_b");
        let last_message_text: Option<String> = row.get("last_message_text");
        let last_message_at: Option<DateTime<Utc>> = row.get("last_message_at");
        let created_at: DateTime<Utc> = row.get("created_at");

        Conversation {
            id: ConversationId::from_uuid(id),
            participants: [UserUid::new(participant_a), UserUid::new(participant_b)],
            last_message_text,
            last_message_at: last_message_at.map(Timestamp::from_datetime),
            unread_by_user,
            created_at: Timestamp::from_datetime(created_at),
        }
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn find_or_create(
        &self,
        a: &UserUid,
        b: &UserUid,
    ) -> Result<Conversation, StoreError> {
        let pair_key = Conversation::pair_key(a, b);

        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, pair_key, participant_a, participant_b, created_at
            ) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (pair_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&pair_key)
        .bind(a.as_str())
        .bind(b.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to insert conversation: {}", e))
        })?;

        let row = sqlx::query(
            r#"
            SELECT id, participant_a, participant_b, last_message_text,
                   last_message_at, created_at
            FROM conversations
            WHERE pair_key = $1
            "#,
        )
        .bind(&pair_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to fetch conversation: {}", e))
        })?;

        let id: Uuid = row.get("id");
        let counters = self.unread_counters(&[id]).await?;
        let unread = counters.get(&id).cloned().unwrap_or_default();
        Ok(Self::row_to_conversation(&row, unread))
    }

    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, participant_a, participant_b, last_message_text,
                   last_message_at, created_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to fetch conversation: {}", e))
        })?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let counters = self.unread_counters(&[*id.as_uuid()]).await?;
        let unread = counters.get(id.as_uuid()).cloned().unwrap_or_default();
        Ok(Some(Self::row_to_conversation(&row, unread)))
    }

    async fn list_for_user(
        &self,
        uid: &UserUid,
    ) -> Result<Vec<Conversation>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, participant_a, participant_b, last_message_text,
                   last_message_at, created_at
            FROM conversations
            WHERE participant_a = $1 OR participant_b = $1
            ORDER BY COALESCE(last_message_at, created_at) DESC, id ASC
            "#,
        )
        .bind(uid.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to list conversations: {}", e))
        })?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
        let mut counters = self.unread_counters(&ids).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                let unread = counters.remove(&id).unwrap_or_default();
                Self::row_to_conversation(row, unread)
            })
            .collect())
    }

    async fn record_message(
        &self,
        id: ConversationId,
        text: &str,
        at: Timestamp,
        unread_for: &UserUid,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            StoreError::Database(format!("Failed to start transaction: {}", e))
        })?;

        let result = sqlx::query(
            r#"
            UPDATE conversations SET
                last_message_text = $2,
                last_message_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(text)
        .bind(at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to update conversation: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "conversation",
            });
        }

        sqlx::query(
            r#"
            INSERT INTO conversation_unread (conversation_id, user_uid, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (conversation_id, user_uid)
            DO UPDATE SET count = conversation_unread.count + 1
            "#,
        )
        .bind(id.as_uuid())
        .bind(unread_for.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to increment unread counter: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            StoreError::Database(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    async fn reset_unread(
        &self,
        id: ConversationId,
        uid: &UserUid,
    ) -> Result<(), StoreError> {
        // Guard the upsert so a missing conversation surfaces as NotFound
        // rather than a foreign-key violation.
        let exists = sqlx::query("SELECT 1 FROM conversations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                StoreError::Database(format!("Failed to fetch conversation: {}", e))
            })?;
        if exists.is_none() {
            return Err(StoreError::NotFound {
                entity: "conversation",
            });
        }

        sqlx::query(
            r#"
            INSERT INTO conversation_unread (conversation_id, user_uid, count)
            VALUES ($1, $2, 0)
            ON CONFLICT (conversation_id, user_uid)
            DO UPDATE SET count = 0
            "#,
        )
        .bind(id.as_uuid())
        .bind(uid.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to reset unread counter: {}", e))
        })?;

        Ok(())
    }
}
