//! WebSocket adapter: connection registry, room fan-out, wire protocol,
//! and the axum upgrade handler.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   ChatService / CommentService           │
//! │        persist first, then broadcast to a room           │
//! └──────────────────────────────────────────────────────────┘
//!                             │ broadcast(room, event)
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                   ConnectionRegistry                     │
//! │  Room: conversation:123       Room: post:7               │
//! │  ├── connection-a             ├── connection-a           │
//! │  └── connection-b             └── connection-c           │
//! └──────────────────────────────────────────────────────────┘
//!                             │ per-connection event channel
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │         handler: one socket task per connection          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - wire protocol types (requests, acks, events)
//! - [`registry`] - connection and room bookkeeping
//! - [`handler`] - axum upgrade handler and request dispatch

pub mod handler;
pub mod messages;
pub mod registry;

pub use handler::{dispatch_request, websocket_router, ws_handler, WebSocketState};
pub use messages::{Ack, ClientRequest, ServerEvent};
pub use registry::{ConnectionId, ConnectionRegistry, RoomId};
