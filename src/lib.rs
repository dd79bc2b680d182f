//! MuseUp realtime core: conversations, rooms, and comment delivery
//! for the artist community platform.
//!
//! The CRUD surface of the platform lives elsewhere; this crate owns the
//! WebSocket side: 1:1 conversations with unread counters, per-post
//! comment rooms, and live fan-out to room members.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
