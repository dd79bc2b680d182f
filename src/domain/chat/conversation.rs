//! Conversation entity: a durable 1:1 message thread between two users.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChatError, ConversationId, Timestamp, UserUid};

/// A 1:1 conversation between exactly two participants.
///
/// Carries denormalized last-message fields for fast listing and a
/// per-participant unread counter. Conversations are created lazily via
/// find-or-create and are never archived or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation identity.
    #[serde(rename = "_id")]
    pub id: ConversationId,

    /// The two participants. Order is not meaningful; uniqueness is
    /// enforced on the canonical [`Conversation::pair_key`].
    pub participants: [UserUid; 2],

    /// Text of the most recent message, if any.
    #[serde(rename = "lastMessageText")]
    pub last_message_text: Option<String>,

    /// Creation time of the most recent message, if any.
    #[serde(rename = "lastMessageAt")]
    pub last_message_at: Option<Timestamp>,

    /// Unread message count per participant uid.
    #[serde(rename = "unreadByUser")]
    pub unread_by_user: HashMap<UserUid, i64>,

    /// When the conversation document was created.
    pub created_at: Timestamp,
}

impl Conversation {
    /// Creates a fresh conversation between two distinct users.
    ///
    /// # Errors
    ///
    /// `InvalidParticipant` if both uids are the same user.
    pub fn between(a: UserUid, b: UserUid) -> Result<Self, ChatError> {
        if a == b {
            return Err(ChatError::InvalidParticipant);
        }
        Ok(Self {
            id: ConversationId::new(),
            participants: [a, b],
            last_message_text: None,
            last_message_at: None,
            unread_by_user: HashMap::new(),
            created_at: Timestamp::now(),
        })
    }

    /// Canonical key for an unordered participant pair.
    ///
    /// Uids are sorted lexicographically and joined with `:`, so both
    /// orderings of the same pair produce the same key. The persistence
    /// layer puts a uniqueness constraint on this key, which is what makes
    /// find-or-create atomic under concurrent callers.
    pub fn pair_key(a: &UserUid, b: &UserUid) -> String {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        format!("{}:{}", first, second)
    }

    /// Whether the given uid is one of the two participants.
    pub fn has_participant(&self, uid: &UserUid) -> bool {
        self.participants.iter().any(|p| p == uid)
    }

    /// The participant other than `uid`, if `uid` belongs to this
    /// conversation.
    pub fn other_participant(&self, uid: &UserUid) -> Option<&UserUid> {
        if !self.has_participant(uid) {
            return None;
        }
        self.participants.iter().find(|p| *p != uid)
    }

    /// Unread count for a participant (zero when never incremented).
    pub fn unread_for(&self, uid: &UserUid) -> i64 {
        self.unread_by_user.get(uid).copied().unwrap_or(0)
    }

    /// Timestamp used for listing order: last message time, falling back
    /// to creation time for conversations with no messages yet.
    pub fn activity_at(&self) -> Timestamp {
        self.last_message_at.unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn between_rejects_self_conversation() {
        let uid = UserUid::new("a");
        let result = Conversation::between(uid.clone(), uid);
        assert!(matches!(result, Err(ChatError::InvalidParticipant)));
    }

    #[test]
    fn pair_key_is_order_independent() {
        let a = UserUid::new("uid-alpha");
        let b = UserUid::new("uid-beta");
        assert_eq!(Conversation::pair_key(&a, &b), Conversation::pair_key(&b, &a));
    }

    #[test]
    fn other_participant_resolves_both_directions() {
        let a = UserUid::new("a");
        let b = UserUid::new("b");
        let conv = Conversation::between(a.clone(), b.clone()).unwrap();

        assert_eq!(conv.other_participant(&a), Some(&b));
        assert_eq!(conv.other_participant(&b), Some(&a));
        assert_eq!(conv.other_participant(&UserUid::new("c")), None);
    }

    #[test]
    fn unread_defaults_to_zero() {
        let conv =
            Conversation::between(UserUid::new("a"), UserUid::new("b")).unwrap();
        assert_eq!(conv.unread_for(&UserUid::new("a")), 0);
    }

    #[test]
    fn activity_falls_back_to_creation_time() {
        let mut conv =
            Conversation::between(UserUid::new("a"), UserUid::new("b")).unwrap();
        assert_eq!(conv.activity_at(), conv.created_at);

        let later = Timestamp::now();
        conv.last_message_at = Some(later);
        assert_eq!(conv.activity_at(), later);
    }

    proptest! {
        #[test]
        fn pair_key_symmetric_for_arbitrary_uids(a in "[a-zA-Z0-9_-]{1,32}", b in "[a-zA-Z0-9_-]{1,32}") {
            let ua = UserUid::new(a);
            let ub = UserUid::new(b);
            prop_assert_eq!(
                Conversation::pair_key(&ua, &ub),
                Conversation::pair_key(&ub, &ua)
            );
        }

        #[test]
        fn pair_key_distinct_pairs_get_distinct_keys(
            a in "[a-z]{1,16}", b in "[a-z]{1,16}", c in "[a-z]{1,16}"
        ) {
            prop_assume!(a != b && a != c && b != c);
            let (ua, ub, uc) = (UserUid::new(a), UserUid::new(b), UserUid::new(c));
            prop_assert_ne!(
                Conversation::pair_key(&ua, &ub),
                Conversation::pair_key(&ua, &uc)
            );
        }
    }
}
