//! Public profile summary attached to conversation listings.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserUid;

/// The slice of a user profile exposed to the other side of a conversation.
///
/// Owned by the platform's user CRUD; the core only reads it through the
/// `ProfileReader` port to enrich `getConversations` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// The user's external identity.
    pub uid: UserUid,

    /// Unique handle, if the user has chosen one.
    pub username: Option<String>,

    /// Display name.
    pub name: Option<String>,

    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

impl ProfileSummary {
    /// A bare summary for users whose profile row is missing.
    pub fn bare(uid: UserUid) -> Self {
        Self {
            uid,
            username: None,
            name: None,
            avatar_url: None,
        }
    }
}
