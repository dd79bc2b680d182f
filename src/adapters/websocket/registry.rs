//! Connection registry and room multiplexer.
//!
//! Tracks live connections, the identity bound to each, and the set of
//! rooms each has joined. Rooms are not stored entities; they exist only as
//! membership sets derived from joins.
//!
//! # Architecture
//!
//! ```text
//! Room: conversation:123   Room: post:7
//! ├── connection-a         ├── connection-a
//! └── connection-b         └── connection-c
//! ```
//!
//! Delivery is push-based: each connection owns an unbounded channel whose
//! receiving end is drained by that connection's socket task. A broadcast
//! clones the event into every member's channel; a send failure for one
//! member (socket task already gone) never affects the others.
//!
//! # Failure semantics
//!
//! Operations on an unknown connection id are no-ops: the connection may
//! have been dropped concurrently with the operation. Join and leave are
//! idempotent.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::domain::foundation::{ConversationId, PostId, UserUid};

use super::messages::ServerEvent;

/// Unique identifier for a live socket connection.
///
/// Generated server-side when a client connects; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random ConnectionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named broadcast group, derived at runtime from joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomId {
    /// All connections viewing a conversation.
    Conversation(ConversationId),
    /// All connections viewing a post's comments.
    Post(PostId),
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::Conversation(id) => write!(f, "conversation:{}", id),
            RoomId::Post(id) => write!(f, "post:{}", id),
        }
    }
}

struct ConnectionEntry {
    /// Identity bound via `identify`; `None` until the client announces
    /// itself.
    user: Option<UserUid>,
    /// Rooms this connection has joined.
    rooms: HashSet<RoomId>,
    /// Outbound event channel drained by the connection's socket task.
    sender: mpsc::UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

/// Process-local bookkeeping for live connections and room membership.
///
/// Owned by the application state and passed explicitly to the socket
/// handler and services - never ambient global state - so it can be unit
/// tested in isolation and swapped for a bus-backed implementation later.
/// The broadcast scope is a single server process by design; running
/// multiple instances without a shared bus will miss events for clients on
/// other instances.
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Registers a new connection with an empty room set and no identity.
    pub async fn register(&self, id: ConnectionId, sender: mpsc::UnboundedSender<ServerEvent>) {
        let mut state = self.state.write().await;
        state.connections.insert(
            id,
            ConnectionEntry {
                user: None,
                rooms: HashSet::new(),
                sender,
            },
        );
        tracing::debug!(connection_id = %id, "connection registered");
    }

    /// Binds a user identity to a connection. A user may hold several
    /// simultaneous connections (multiple tabs or devices). No-op for
    /// unknown connections.
    pub async fn identify(&self, id: ConnectionId, uid: UserUid) {
        let mut state = self.state.write().await;
        if let Some(entry) = state.connections.get_mut(&id) {
            tracing::debug!(connection_id = %id, user_uid = %uid, "connection identified");
            entry.user = Some(uid);
        }
    }

    /// The identity bound to a connection, if any.
    pub async fn identity(&self, id: ConnectionId) -> Option<UserUid> {
        let state = self.state.read().await;
        state.connections.get(&id).and_then(|e| e.user.clone())
    }

    /// Joins a connection to a room. Idempotent; no-op for unknown
    /// connections. Joining triggers no history replay - history is
    /// fetched by a separate explicit call.
    pub async fn join(&self, id: ConnectionId, room: RoomId) {
        let mut state = self.state.write().await;
        let Some(entry) = state.connections.get_mut(&id) else {
            return;
        };
        entry.rooms.insert(room);
        state.rooms.entry(room).or_default().insert(id);
        tracing::debug!(connection_id = %id, room = %room, "joined room");
    }

    /// Removes a connection from a room. Idempotent; leaving a never-joined
    /// room is a no-op, not an error. Empty rooms are cleaned up.
    pub async fn leave(&self, id: ConnectionId, room: RoomId) {
        let mut state = self.state.write().await;
        if let Some(entry) = state.connections.get_mut(&id) {
            entry.rooms.remove(&room);
        }
        if let Some(members) = state.rooms.get_mut(&room) {
            members.remove(&id);
            if members.is_empty() {
                state.rooms.remove(&room);
            }
        }
    }

    /// Drops a connection: removes all room memberships, the identity
    /// association, and the outbound channel. Called on disconnect. No
    /// externally visible side effect (no presence broadcast).
    pub async fn drop_connection(&self, id: ConnectionId) {
        let mut state = self.state.write().await;
        let Some(entry) = state.connections.remove(&id) else {
            return;
        };
        for room in entry.rooms {
            if let Some(members) = state.rooms.get_mut(&room) {
                members.remove(&id);
                if members.is_empty() {
                    state.rooms.remove(&room);
                }
            }
        }
        tracing::debug!(connection_id = %id, "connection dropped");
    }

    /// Delivers an event to every connection currently joined to the room.
    ///
    /// All members observe the same payload value; iteration order carries
    /// no ordering guarantee across connections. Broadcasting to an empty
    /// or unknown room is a no-op. Pushes are non-blocking per connection;
    /// a closed channel (socket task shutting down) is ignored.
    pub async fn broadcast(&self, room: RoomId, event: ServerEvent) {
        let state = self.state.read().await;
        let Some(members) = state.rooms.get(&room) else {
            return;
        };
        for member in members {
            if let Some(entry) = state.connections.get(member) {
                let _ = entry.sender.send(event.clone());
            }
        }
    }

    /// Pushes an event to a single connection (used for acks). No-op for
    /// unknown connections.
    pub async fn send_to(&self, id: ConnectionId, event: ServerEvent) {
        let state = self.state.read().await;
        if let Some(entry) = state.connections.get(&id) {
            let _ = entry.sender.send(event);
        }
    }

    /// Number of connections currently joined to a room.
    pub async fn room_size(&self, room: RoomId) -> usize {
        let state = self.state.read().await;
        state.rooms.get(&room).map(|m| m.len()).unwrap_or(0)
    }

    /// Total live connections (for monitoring).
    pub async fn connection_count(&self) -> usize {
        let state = self.state.read().await;
        state.connections.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
