//! WebSocket upgrade handler and per-connection request loop.
//!
//! Connection lifecycle:
//! 1. Upgrade HTTP → WebSocket and register the connection
//! 2. Spawn a send task draining the connection's event channel
//! 3. Handle inbound requests one at a time, to completion, in arrival
//!    order (per-connection FIFO; persistence calls are the only
//!    suspension points)
//! 4. Drop the connection and all room memberships on disconnect
//!
//! A failed operation acks `{ok: false}` (when the operation has an ack
//! path) and never drops the connection.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;

use crate::application::{ChatService, CommentService};
use crate::domain::foundation::{ChatError, UserUid};
use crate::ports::TokenVerifier;

use super::{
    messages::{Ack, ClientRequest},
    registry::{ConnectionId, ConnectionRegistry},
};

/// Shared state for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub registry: Arc<ConnectionRegistry>,
    pub chat: Arc<ChatService>,
    pub comments: Arc<CommentService>,
    pub verifier: Arc<dyn TokenVerifier>,
    /// Maximum accepted frame size in bytes.
    pub max_frame_bytes: usize,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.max_message_size(state.max_frame_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sink, mut stream) = socket.split();

    let connection_id = ConnectionId::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    state.registry.register(connection_id, tx).await;

    // Forward queued events (acks and room broadcasts) to the client.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to encode server event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Inbound requests are handled to completion before the next frame is
    // read, which is what gives each connection FIFO request semantics.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientRequest>(&text) {
                Ok(request) => dispatch_request(&state, connection_id, request).await,
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "discarding unparseable frame: {}",
                        e
                    );
                }
            },
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "client sent close frame");
                break;
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    "received unsupported binary message"
                );
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Protocol-level keepalive, handled by axum.
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, "receive error: {}", e);
                break;
            }
        }
    }

    state.registry.drop_connection(connection_id).await;
    send_task.abort();
}

/// Routes one client request to the owning service and queues the ack (for
/// operations that have one).
///
/// Identity rules: `identify` binds a verified uid to the connection;
/// every identity-bearing operation is then checked against the bound
/// identity. A mismatching client-supplied uid is `Forbidden`; an
/// identity-requiring call on an unidentified connection is
/// `NotIdentified`.
pub async fn dispatch_request(
    state: &WebSocketState,
    connection_id: ConnectionId,
    request: ClientRequest,
) {
    match request {
        ClientRequest::Identify { token, request_id } => {
            match state.verifier.verify(&token).await {
                Ok(uid) => {
                    state.registry.identify(connection_id, uid.clone()).await;
                    let ack = Ack::ok(request_id, json!({ "uid": uid }));
                    state.registry.send_to(connection_id, ack).await;
                }
                Err(e) => {
                    let err = ChatError::InvalidToken(e.to_string());
                    tracing::warn!(connection_id = %connection_id, "identify failed: {}", err);
                    state
                        .registry
                        .send_to(connection_id, Ack::err(request_id, &err))
                        .await;
                }
            }
        }

        ClientRequest::JoinPost { post_id } => {
            state.comments.join_post(connection_id, post_id).await;
        }

        ClientRequest::NewComment {
            post_id,
            user_id,
            body,
        } => {
            // Broadcast-only flow: no ack path, so failures are only logged.
            let result = match bound_identity(state, connection_id, &user_id).await {
                Ok(uid) => state.comments.new_comment(post_id, &uid, &body).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(
                    connection_id = %connection_id,
                    post_id = %post_id,
                    "new_comment rejected: {}",
                    e
                );
            }
        }

        ClientRequest::JoinConversation {
            conversation_id,
            user_uid,
        } => {
            let result = match bound_identity(state, connection_id, &user_uid).await {
                Ok(uid) => {
                    state
                        .chat
                        .join_conversation(connection_id, conversation_id, &uid)
                        .await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(
                    connection_id = %connection_id,
                    conversation_id = %conversation_id,
                    "joinConversation rejected: {}",
                    e
                );
            }
        }

        ClientRequest::GetConversations {
            user_uid,
            request_id,
        } => {
            let ack = match bound_identity(state, connection_id, &user_uid).await {
                Ok(uid) => match state.chat.get_conversations(&uid).await {
                    Ok(conversations) => {
                        Ack::ok(request_id, json!({ "conversations": conversations }))
                    }
                    Err(e) => Ack::err(request_id, &e),
                },
                Err(e) => Ack::err(request_id, &e),
            };
            state.registry.send_to(connection_id, ack).await;
        }

        ClientRequest::GetMessages {
            conversation_id,
            request_id,
        } => {
            let ack = match require_identity(state, connection_id).await {
                Ok(uid) => match state.chat.get_messages(conversation_id, &uid).await {
                    Ok(messages) => Ack::ok(request_id, json!({ "messages": messages })),
                    Err(e) => Ack::err(request_id, &e),
                },
                Err(e) => Ack::err(request_id, &e),
            };
            state.registry.send_to(connection_id, ack).await;
        }

        ClientRequest::SendMessage {
            conversation_id,
            sender_uid,
            text,
            request_id,
        } => {
            let ack = match bound_identity(state, connection_id, &sender_uid).await {
                Ok(uid) => match state.chat.send_message(conversation_id, &uid, &text).await {
                    Ok(message) => Ack::ok(request_id, json!({ "message": message })),
                    Err(e) => Ack::err(request_id, &e),
                },
                Err(e) => Ack::err(request_id, &e),
            };
            state.registry.send_to(connection_id, ack).await;
        }

        ClientRequest::MarkConversationRead {
            conversation_id,
            user_uid,
        } => {
            let result = match bound_identity(state, connection_id, &user_uid).await {
                Ok(uid) => {
                    state
                        .chat
                        .mark_conversation_read(conversation_id, &uid)
                        .await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(
                    connection_id = %connection_id,
                    conversation_id = %conversation_id,
                    "markConversationRead rejected: {}",
                    e
                );
            }
        }

        ClientRequest::StartConversation {
            current_user_uid,
            other_user_uid,
            request_id,
        } => {
            let ack = match bound_identity(state, connection_id, &current_user_uid).await {
                Ok(uid) => match state.chat.start_conversation(&uid, &other_user_uid).await {
                    Ok(conversation) => {
                        Ack::ok(request_id, json!({ "conversation": conversation }))
                    }
                    Err(e) => Ack::err(request_id, &e),
                },
                Err(e) => Ack::err(request_id, &e),
            };
            state.registry.send_to(connection_id, ack).await;
        }
    }
}

/// The identity bound to the connection, or `NotIdentified`.
async fn require_identity(
    state: &WebSocketState,
    connection_id: ConnectionId,
) -> Result<UserUid, ChatError> {
    state
        .registry
        .identity(connection_id)
        .await
        .ok_or(ChatError::NotIdentified)
}

/// The bound identity, additionally checked against the client-supplied
/// uid field kept for wire compatibility.
async fn bound_identity(
    state: &WebSocketState,
    connection_id: ConnectionId,
    claimed: &UserUid,
) -> Result<UserUid, ChatError> {
    let bound = require_identity(state, connection_id).await?;
    if &bound != claimed {
        return Err(ChatError::Forbidden);
    }
    Ok(bound)
}

/// Create the axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
