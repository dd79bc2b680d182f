//! Profile reader port.

use async_trait::async_trait;

use crate::domain::chat::ProfileSummary;
use crate::domain::foundation::UserUid;

use super::StoreError;

/// Read-only access to public profile summaries.
///
/// Profiles are owned by the platform's user CRUD; the core only reads the
/// public slice to enrich conversation listings with the other
/// participant's name and avatar.
#[async_trait]
pub trait ProfileReader: Send + Sync {
    /// Fetches the public summary for a user.
    ///
    /// Returns `None` if no profile row exists for the uid.
    async fn profile(&self, uid: &UserUid) -> Result<Option<ProfileSummary>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_reader_is_object_safe() {
        fn _accepts_dyn(_reader: &dyn ProfileReader) {}
    }
}
