//! PostgreSQL implementation of CommentStore.
//!
//! Comment ids come from the table's sequence via `RETURNING`, so
//! concurrent inserts can never collide.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::chat::Comment;
use crate::domain::foundation::{CommentId, PostId, Timestamp, UserUid};
use crate::ports::{CommentStore, StoreError};

/// PostgreSQL implementation of CommentStore.
#[derive(Clone)]
pub struct PostgresCommentStore {
    pool: PgPool,
}

impl PostgresCommentStore {
    /// Creates a new PostgresCommentStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PostgresCommentStore {
    async fn insert(
        &self,
        post_id: PostId,
        user_id: &UserUid,
        body: &str,
    ) -> Result<Comment, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO comments (post_id, user_uid, body, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(post_id.as_i64())
        .bind(user_id.as_str())
        .bind(body)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert comment: {}", e)))?;

        let id: i64 = row.get("id");
        let created_at: DateTime<Utc> = row.get("created_at");

        Ok(Comment {
            id: CommentId::new(id),
            post_id,
            user_id: user_id.clone(),
            body: body.to_string(),
            created_at: Timestamp::from_datetime(created_at),
        })
    }
}
