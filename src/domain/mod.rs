//! Domain layer: entities, value objects, and the error taxonomy.

pub mod chat;
pub mod foundation;
