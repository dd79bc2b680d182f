//! Adapters: infrastructure implementations of the ports.

pub mod auth;
pub mod memory;
pub mod postgres;
pub mod websocket;
