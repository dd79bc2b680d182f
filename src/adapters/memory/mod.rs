//! In-memory adapter implementations.
//!
//! Process-local twins of the Postgres adapters, used by the test suite
//! and for running the server without a database.

mod comment_store;
mod conversation_store;
mod message_store;
mod profile_reader;

pub use comment_store::InMemoryCommentStore;
pub use conversation_store::InMemoryConversationStore;
pub use message_store::InMemoryMessageStore;
pub use profile_reader::InMemoryProfileReader;
