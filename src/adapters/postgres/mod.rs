//! PostgreSQL adapter implementations.

mod comment_store;
mod conversation_store;
mod message_store;
mod profile_reader;

pub use comment_store::PostgresCommentStore;
pub use conversation_store::PostgresConversationStore;
pub use message_store::PostgresMessageStore;
pub use profile_reader::PostgresProfileReader;
