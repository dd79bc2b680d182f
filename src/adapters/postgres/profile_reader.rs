//! PostgreSQL implementation of ProfileReader.
//!
//! Reads the platform's `users` table, which the CRUD side owns; this
//! adapter only ever selects from it.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::chat::ProfileSummary;
use crate::domain::foundation::UserUid;
use crate::ports::{ProfileReader, StoreError};

/// PostgreSQL implementation of ProfileReader.
#[derive(Clone)]
pub struct PostgresProfileReader {
    pool: PgPool,
}

impl PostgresProfileReader {
    /// Creates a new PostgresProfileReader.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileReader for PostgresProfileReader {
    async fn profile(&self, uid: &UserUid) -> Result<Option<ProfileSummary>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT uid, username, display_name, avatar_url
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(uid.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch profile: {}", e)))?;

        Ok(row.map(|row| {
            let uid: String = row.get("uid");
            let username: Option<String> = row.get("username");
            let name: Option<String> = row.get("display_name");
            let avatar_url: Option<String> = row.get("avatar_url");

            ProfileSummary {
                uid: UserUid::new(uid),
                username,
                name,
                avatar_url,
            }
        }))
    }
}
