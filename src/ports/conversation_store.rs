//! Conversation store port.
//!
//! Contract for persisting conversation documents and their per-participant
//! unread counters.
//!
//! # Design
//!
//! - **Atomic find-or-create**: at most one document may ever exist for a
//!   given unordered participant pair. Implementations back this with a
//!   uniqueness constraint on the canonical pair key (see
//!   [`Conversation::pair_key`]) rather than a find-then-create sequence.
//! - **Atomic unread accounting**: counter increments must not lose updates
//!   under concurrent senders.

use async_trait::async_trait;

use crate::domain::chat::Conversation;
use crate::domain::foundation::{ConversationId, Timestamp, UserUid};

use super::StoreError;

/// Repository port for conversation documents.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Finds the conversation for the unordered pair, creating it if absent.
    ///
    /// Idempotent under concurrent callers: all racing calls for the same
    /// pair resolve to the same conversation identity. Participant order in
    /// the arguments is not meaningful.
    ///
    /// # Errors
    ///
    /// `Database` on persistence failure.
    async fn find_or_create(
        &self,
        a: &UserUid,
        b: &UserUid,
    ) -> Result<Conversation, StoreError>;

    /// Fetches a conversation by id, including its unread counters.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError>;

    /// Lists all conversations where `uid` is a participant.
    ///
    /// Ordered descending by last-message time, falling back to creation
    /// time for message-less conversations; conversation id breaks ties so
    /// the order is deterministic.
    async fn list_for_user(&self, uid: &UserUid)
        -> Result<Vec<Conversation>, StoreError>;

    /// Records the denormalized effects of a newly persisted message:
    /// updates the last-message fields and atomically increments the unread
    /// counter of `unread_for` (the non-sending participant).
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation does not exist
    /// - `Database` on persistence failure
    async fn record_message(
        &self,
        id: ConversationId,
        text: &str,
        at: Timestamp,
        unread_for: &UserUid,
    ) -> Result<(), StoreError>;

    /// Resets `uid`'s unread counter for the conversation to zero.
    ///
    /// Idempotent; resetting an already-zero counter is a no-op.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation does not exist
    /// - `Database` on persistence failure
    async fn reset_unread(
        &self,
        id: ConversationId,
        uid: &UserUid,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn ConversationStore) {}
    }
}
