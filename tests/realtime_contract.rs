//! Integration tests for the real-time messaging contract.
//!
//! Drives the WebSocket dispatch layer end to end over in-memory
//! adapters: identity binding, conversation lifecycle, unread
//! accounting, room-scoped fan-out, and the ack envelope shapes.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use museup_realtime::adapters::auth::MockTokenVerifier;
use museup_realtime::adapters::memory::{
    InMemoryCommentStore, InMemoryConversationStore, InMemoryMessageStore,
    InMemoryProfileReader,
};
use museup_realtime::adapters::websocket::{
    dispatch_request, ClientRequest, ConnectionId, ConnectionRegistry, ServerEvent,
    WebSocketState,
};
use museup_realtime::application::{ChatService, CommentService};
use museup_realtime::domain::chat::ProfileSummary;
use museup_realtime::domain::foundation::{ConversationId, PostId, UserUid};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    state: WebSocketState,
    verifier: Arc<MockTokenVerifier>,
    profiles: Arc<InMemoryProfileReader>,
}

struct Client {
    id: ConnectionId,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestApp {
    async fn new() -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let profiles = Arc::new(InMemoryProfileReader::new());
        let verifier = Arc::new(MockTokenVerifier::new());

        let chat = Arc::new(ChatService::new(
            Arc::new(InMemoryConversationStore::new()),
            Arc::new(InMemoryMessageStore::new()),
            profiles.clone(),
            registry.clone(),
        ));
        let comments = Arc::new(CommentService::new(
            Arc::new(InMemoryCommentStore::new()),
            registry.clone(),
        ));

        let state = WebSocketState {
            registry,
            chat,
            comments,
            verifier: verifier.clone(),
            max_frame_bytes: 64 * 1024,
        };

        Self {
            state,
            verifier,
            profiles,
        }
    }

    async fn connect(&self) -> Client {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.registry.register(id, tx).await;
        Client { id, rx }
    }

    /// Connects and binds an identity through the real `identify` flow.
    async fn connect_as(&self, uid: &str) -> Client {
        let token = format!("tok-{}", uid);
        self.verifier.accept(token.clone(), UserUid::new(uid)).await;

        let mut client = self.connect().await;
        dispatch_request(
            &self.state,
            client.id,
            ClientRequest::Identify {
                token,
                request_id: Some("identify".to_string()),
            },
        )
        .await;

        let ack = client.ack().await;
        assert_eq!(ack["ok"], Value::Bool(true));
        assert_eq!(ack["uid"], Value::String(uid.to_string()));
        client
    }

    async fn dispatch(&self, client: &Client, request: ClientRequest) {
        dispatch_request(&self.state, client.id, request).await;
    }
}

impl Client {
    /// Next queued server event, as JSON.
    async fn event(&mut self) -> Value {
        let event = self.rx.recv().await.expect("expected a server event");
        serde_json::to_value(&event).unwrap()
    }

    /// Next queued event, asserted to be an ack envelope.
    async fn ack(&mut self) -> Value {
        let event = self.event().await;
        assert_eq!(event["type"], Value::String("ack".to_string()));
        event
    }

    fn no_pending_events(&mut self) {
        assert!(
            self.rx.try_recv().is_err(),
            "expected no queued events for this connection"
        );
    }
}

fn start_conversation(current: &str, other: &str, request_id: &str) -> ClientRequest {
    ClientRequest::StartConversation {
        current_user_uid: UserUid::new(current),
        other_user_uid: UserUid::new(other),
        request_id: Some(request_id.to_string()),
    }
}

fn send_message(conversation_id: ConversationId, sender: &str, text: &str) -> ClientRequest {
    ClientRequest::SendMessage {
        conversation_id,
        sender_uid: UserUid::new(sender),
        text: text.to_string(),
        request_id: Some("send".to_string()),
    }
}

fn conversation_id_from_ack(ack: &Value) -> ConversationId {
    ack["conversation"]["_id"]
        .as_str()
        .expect("ack should carry the conversation")
        .parse()
        .unwrap()
}

/// Starts a conversation between two identified clients and returns its id.
async fn establish_conversation(app: &TestApp, a: &mut Client, a_uid: &str, b_uid: &str) -> ConversationId {
    app.dispatch(a, start_conversation(a_uid, b_uid, "start")).await;
    let ack = a.ack().await;
    assert_eq!(ack["ok"], Value::Bool(true));
    conversation_id_from_ack(&ack)
}

// =============================================================================
// Identity binding
// =============================================================================

#[tokio::test]
async fn identify_with_bad_token_is_rejected() {
    let app = TestApp::new().await;
    let mut client = app.connect().await;

    app.dispatch(
        &client,
        ClientRequest::Identify {
            token: "forged".to_string(),
            request_id: Some("r1".to_string()),
        },
    )
    .await;

    let ack = client.ack().await;
    assert_eq!(ack["ok"], Value::Bool(false));
    assert_eq!(ack["code"], Value::String("INVALID_TOKEN".to_string()));
    assert_eq!(ack["requestId"], Value::String("r1".to_string()));
}

#[tokio::test]
async fn operations_before_identify_are_not_identified() {
    let app = TestApp::new().await;
    let mut client = app.connect().await;

    app.dispatch(
        &client,
        ClientRequest::GetMessages {
            conversation_id: ConversationId::new(),
            request_id: Some("r1".to_string()),
        },
    )
    .await;

    let ack = client.ack().await;
    assert_eq!(ack["ok"], Value::Bool(false));
    assert_eq!(ack["code"], Value::String("NOT_IDENTIFIED".to_string()));
}

#[tokio::test]
async fn claimed_uid_must_match_bound_identity() {
    let app = TestApp::new().await;
    let mut alice = app.connect_as("alice").await;

    // alice's connection claims to act as bob
    app.dispatch(
        &alice,
        ClientRequest::GetConversations {
            user_uid: UserUid::new("bob"),
            request_id: Some("r1".to_string()),
        },
    )
    .await;

    let ack = alice.ack().await;
    assert_eq!(ack["ok"], Value::Bool(false));
    assert_eq!(ack["code"], Value::String("FORBIDDEN".to_string()));
}

// =============================================================================
// Conversation lifecycle
// =============================================================================

#[tokio::test]
async fn concurrent_starts_converge_on_one_conversation() {
    let app = TestApp::new().await;
    let mut alice = app.connect_as("alice").await;
    let mut bob = app.connect_as("bob").await;

    // Both sides race find-or-create with the pair in opposite order.
    tokio::join!(
        dispatch_request(&app.state, alice.id, start_conversation("alice", "bob", "a")),
        dispatch_request(&app.state, bob.id, start_conversation("bob", "alice", "b")),
    );

    let ack_a = alice.ack().await;
    let ack_b = bob.ack().await;
    assert_eq!(ack_a["ok"], Value::Bool(true));
    assert_eq!(ack_b["ok"], Value::Bool(true));
    assert_eq!(
        conversation_id_from_ack(&ack_a),
        conversation_id_from_ack(&ack_b)
    );
}

#[tokio::test]
async fn starting_a_conversation_with_yourself_is_rejected() {
    let app = TestApp::new().await;
    let mut alice = app.connect_as("alice").await;

    app.dispatch(&alice, start_conversation("alice", "alice", "r1"))
        .await;

    let ack = alice.ack().await;
    assert_eq!(ack["ok"], Value::Bool(false));
    assert_eq!(
        ack["code"],
        Value::String("INVALID_PARTICIPANT".to_string())
    );

    // Nothing was created.
    app.dispatch(
        &alice,
        ClientRequest::GetConversations {
            user_uid: UserUid::new("alice"),
            request_id: Some("r2".to_string()),
        },
    )
    .await;
    let ack = alice.ack().await;
    assert_eq!(ack["ok"], Value::Bool(true));
    assert_eq!(ack["conversations"], Value::Array(vec![]));
}

#[tokio::test]
async fn listing_enriches_with_the_other_participants_profile() {
    let app = TestApp::new().await;
    app.profiles
        .upsert(ProfileSummary {
            uid: UserUid::new("bob"),
            username: Some("bob_draws".to_string()),
            name: Some("Bob".to_string()),
            avatar_url: None,
        })
        .await;

    let mut alice = app.connect_as("alice").await;
    establish_conversation(&app, &mut alice, "alice", "bob").await;

    app.dispatch(
        &alice,
        ClientRequest::GetConversations {
            user_uid: UserUid::new("alice"),
            request_id: Some("list".to_string()),
        },
    )
    .await;

    let ack = alice.ack().await;
    let conversations = ack["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["otherUser"]["uid"], "bob");
    assert_eq!(conversations[0]["otherUser"]["username"], "bob_draws");
    assert_eq!(conversations[0]["unread_count"], 0);
}

// =============================================================================
// Messaging and unread accounting
// =============================================================================

#[tokio::test]
async fn message_flow_delivers_and_tracks_unread() {
    let app = TestApp::new().await;
    let mut alice = app.connect_as("alice").await;
    let mut bob = app.connect_as("bob").await;

    let conversation_id = establish_conversation(&app, &mut alice, "alice", "bob").await;

    // Both participants watch the conversation room.
    app.dispatch(
        &alice,
        ClientRequest::JoinConversation {
            conversation_id,
            user_uid: UserUid::new("alice"),
        },
    )
    .await;
    app.dispatch(
        &bob,
        ClientRequest::JoinConversation {
            conversation_id,
            user_uid: UserUid::new("bob"),
        },
    )
    .await;

    app.dispatch(&alice, send_message(conversation_id, "alice", "hi bob"))
        .await;

    // Both room members get the broadcast with the full entity; the
    // sender additionally gets the ack.
    let broadcast = bob.event().await;
    assert_eq!(broadcast["type"], "message");
    assert_eq!(broadcast["message"]["text"], "hi bob");
    assert_eq!(broadcast["message"]["sender_uid"], "alice");

    let echoed = alice.event().await;
    assert_eq!(echoed["type"], "message");
    let ack = alice.ack().await;
    assert_eq!(ack["ok"], Value::Bool(true));
    assert_eq!(ack["message"]["text"], "hi bob");

    // Recipient sees unread 1, resets it, sees 0. Sender stays at 0.
    app.dispatch(
        &bob,
        ClientRequest::GetConversations {
            user_uid: UserUid::new("bob"),
            request_id: Some("list".to_string()),
        },
    )
    .await;
    let ack = bob.ack().await;
    assert_eq!(ack["conversations"][0]["unread_count"], 1);
    assert_eq!(ack["conversations"][0]["lastMessageText"], "hi bob");

    app.dispatch(
        &bob,
        ClientRequest::MarkConversationRead {
            conversation_id,
            user_uid: UserUid::new("bob"),
        },
    )
    .await;

    app.dispatch(
        &bob,
        ClientRequest::GetConversations {
            user_uid: UserUid::new("bob"),
            request_id: Some("list2".to_string()),
        },
    )
    .await;
    let ack = bob.ack().await;
    assert_eq!(ack["conversations"][0]["unread_count"], 0);

    app.dispatch(
        &alice,
        ClientRequest::GetConversations {
            user_uid: UserUid::new("alice"),
            request_id: Some("list3".to_string()),
        },
    )
    .await;
    let ack = alice.ack().await;
    assert_eq!(ack["conversations"][0]["unread_count"], 0);
}

#[tokio::test]
async fn every_tab_of_the_same_user_receives_the_broadcast() {
    let app = TestApp::new().await;
    let mut alice_tab_one = app.connect_as("alice").await;
    let mut alice_tab_two = app.connect_as("alice").await;
    let mut bob = app.connect_as("bob").await;

    let conversation_id =
        establish_conversation(&app, &mut alice_tab_one, "alice", "bob").await;

    // One identity, two live connections, both watching the same room.
    for tab in [&alice_tab_one, &alice_tab_two] {
        app.dispatch(
            tab,
            ClientRequest::JoinConversation {
                conversation_id,
                user_uid: UserUid::new("alice"),
            },
        )
        .await;
    }

    app.dispatch(&bob, send_message(conversation_id, "bob", "hi alice"))
        .await;
    bob.ack().await;

    for tab in [&mut alice_tab_one, &mut alice_tab_two] {
        let event = tab.event().await;
        assert_eq!(event["type"], "message");
        assert_eq!(event["message"]["text"], "hi alice");
        assert_eq!(event["message"]["sender_uid"], "bob");
    }
}

#[tokio::test]
async fn unread_accumulates_per_message() {
    let app = TestApp::new().await;
    let mut alice = app.connect_as("alice").await;
    let mut bob = app.connect_as("bob").await;

    let conversation_id = establish_conversation(&app, &mut alice, "alice", "bob").await;

    for text in ["one", "two", "three"] {
        app.dispatch(&alice, send_message(conversation_id, "alice", text))
            .await;
        alice.ack().await;
    }

    app.dispatch(
        &bob,
        ClientRequest::GetConversations {
            user_uid: UserUid::new("bob"),
            request_id: Some("list".to_string()),
        },
    )
    .await;
    let ack = bob.ack().await;
    assert_eq!(ack["conversations"][0]["unread_count"], 3);
    assert_eq!(ack["conversations"][0]["lastMessageText"], "three");
}

#[tokio::test]
async fn history_is_ascending_and_matches_broadcast_order() {
    let app = TestApp::new().await;
    let mut alice = app.connect_as("alice").await;
    let mut bob = app.connect_as("bob").await;

    let conversation_id = establish_conversation(&app, &mut alice, "alice", "bob").await;
    app.dispatch(
        &bob,
        ClientRequest::JoinConversation {
            conversation_id,
            user_uid: UserUid::new("bob"),
        },
    )
    .await;

    for text in ["first", "second", "third"] {
        app.dispatch(&alice, send_message(conversation_id, "alice", text))
            .await;
        alice.ack().await;
    }

    // Broadcasts arrive in send order.
    for expected in ["first", "second", "third"] {
        let event = bob.event().await;
        assert_eq!(event["message"]["text"], *expected);
    }

    // History replays the same order.
    app.dispatch(
        &bob,
        ClientRequest::GetMessages {
            conversation_id,
            request_id: Some("history".to_string()),
        },
    )
    .await;
    let ack = bob.ack().await;
    let messages = ack["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    for (message, expected) in messages.iter().zip(["first", "second", "third"]) {
        assert_eq!(message["text"], expected);
    }
}

#[tokio::test]
async fn empty_message_is_rejected_and_nothing_is_broadcast() {
    let app = TestApp::new().await;
    let mut alice = app.connect_as("alice").await;
    let mut bob = app.connect_as("bob").await;

    let conversation_id = establish_conversation(&app, &mut alice, "alice", "bob").await;
    app.dispatch(
        &bob,
        ClientRequest::JoinConversation {
            conversation_id,
            user_uid: UserUid::new("bob"),
        },
    )
    .await;

    app.dispatch(&alice, send_message(conversation_id, "alice", "   "))
        .await;

    let ack = alice.ack().await;
    assert_eq!(ack["ok"], Value::Bool(false));
    assert_eq!(ack["code"], Value::String("EMPTY_MESSAGE".to_string()));
    bob.no_pending_events();

    // Nothing was persisted either.
    app.dispatch(
        &alice,
        ClientRequest::GetMessages {
            conversation_id,
            request_id: Some("history".to_string()),
        },
    )
    .await;
    let ack = alice.ack().await;
    assert_eq!(ack["messages"], Value::Array(vec![]));
}

#[tokio::test]
async fn outsiders_cannot_read_or_write_a_conversation() {
    let app = TestApp::new().await;
    let mut alice = app.connect_as("alice").await;
    let mut mallory = app.connect_as("mallory").await;

    let conversation_id = establish_conversation(&app, &mut alice, "alice", "bob").await;

    app.dispatch(&mallory, send_message(conversation_id, "mallory", "hi"))
        .await;
    let ack = mallory.ack().await;
    assert_eq!(ack["code"], Value::String("FORBIDDEN".to_string()));

    app.dispatch(
        &mallory,
        ClientRequest::GetMessages {
            conversation_id,
            request_id: Some("history".to_string()),
        },
    )
    .await;
    let ack = mallory.ack().await;
    assert_eq!(ack["code"], Value::String("FORBIDDEN".to_string()));

    // A join attempt is silently rejected: no membership, no broadcasts.
    app.dispatch(
        &mallory,
        ClientRequest::JoinConversation {
            conversation_id,
            user_uid: UserUid::new("mallory"),
        },
    )
    .await;
    app.dispatch(&alice, send_message(conversation_id, "alice", "secret"))
        .await;
    alice.ack().await;
    mallory.no_pending_events();
}

#[tokio::test]
async fn unknown_conversation_is_reported_as_not_found() {
    let app = TestApp::new().await;
    let mut alice = app.connect_as("alice").await;

    app.dispatch(
        &alice,
        ClientRequest::GetMessages {
            conversation_id: ConversationId::new(),
            request_id: Some("r1".to_string()),
        },
    )
    .await;

    let ack = alice.ack().await;
    assert_eq!(ack["ok"], Value::Bool(false));
    assert_eq!(
        ack["code"],
        Value::String("CONVERSATION_NOT_FOUND".to_string())
    );
}

// =============================================================================
// Comment rooms
// =============================================================================

#[tokio::test]
async fn comments_fan_out_to_the_posts_room_only() {
    let app = TestApp::new().await;
    let mut viewer_a = app.connect_as("viewer-a").await;
    let mut viewer_b = app.connect_as("viewer-b").await;
    let mut elsewhere = app.connect_as("viewer-c").await;
    let mut author = app.connect_as("author").await;

    app.dispatch(&viewer_a, ClientRequest::JoinPost { post_id: PostId::new(1) })
        .await;
    app.dispatch(&viewer_b, ClientRequest::JoinPost { post_id: PostId::new(1) })
        .await;
    app.dispatch(&elsewhere, ClientRequest::JoinPost { post_id: PostId::new(2) })
        .await;

    app.dispatch(
        &author,
        ClientRequest::NewComment {
            post_id: PostId::new(1),
            user_id: UserUid::new("author"),
            body: "love the colors".to_string(),
        },
    )
    .await;

    for viewer in [&mut viewer_a, &mut viewer_b] {
        let event = viewer.event().await;
        assert_eq!(event["type"], "new_comment");
        assert_eq!(event["post_id"], 1);
        assert_eq!(event["user_id"], "author");
        assert_eq!(event["body"], "love the colors");
        assert_eq!(event["id"], 1);
    }
    elsewhere.no_pending_events();

    // The author never joined the post room, so it does not even see its
    // own comment echoed; the flow has no ack path.
    author.no_pending_events();
}

#[tokio::test]
async fn comment_ids_are_assigned_sequentially() {
    let app = TestApp::new().await;
    let mut viewer = app.connect_as("viewer").await;
    let author = app.connect_as("author").await;

    app.dispatch(&viewer, ClientRequest::JoinPost { post_id: PostId::new(5) })
        .await;

    for body in ["first", "second"] {
        app.dispatch(
            &author,
            ClientRequest::NewComment {
                post_id: PostId::new(5),
                user_id: UserUid::new("author"),
                body: body.to_string(),
            },
        )
        .await;
    }

    let first = viewer.event().await;
    let second = viewer.event().await;
    assert_eq!(first["id"], 1);
    assert_eq!(second["id"], 2);
}

#[tokio::test]
async fn comment_from_mismatched_identity_is_dropped() {
    let app = TestApp::new().await;
    let mut viewer = app.connect_as("viewer").await;
    let author = app.connect_as("author").await;

    app.dispatch(&viewer, ClientRequest::JoinPost { post_id: PostId::new(3) })
        .await;

    // author's connection claims someone else's uid; no ack path, the
    // comment is just dropped.
    app.dispatch(
        &author,
        ClientRequest::NewComment {
            post_id: PostId::new(3),
            user_id: UserUid::new("somebody-else"),
            body: "spoofed".to_string(),
        },
    )
    .await;

    viewer.no_pending_events();
}

// =============================================================================
// Disconnect semantics
// =============================================================================

#[tokio::test]
async fn dropped_connections_stop_receiving_broadcasts() {
    let app = TestApp::new().await;
    let mut staying = app.connect_as("staying").await;
    let mut leaving = app.connect_as("leaving").await;
    let author = app.connect_as("author").await;

    app.dispatch(&staying, ClientRequest::JoinPost { post_id: PostId::new(9) })
        .await;
    app.dispatch(&leaving, ClientRequest::JoinPost { post_id: PostId::new(9) })
        .await;

    app.state.registry.drop_connection(leaving.id).await;

    app.dispatch(
        &author,
        ClientRequest::NewComment {
            post_id: PostId::new(9),
            user_id: UserUid::new("author"),
            body: "still here?".to_string(),
        },
    )
    .await;

    let event = staying.event().await;
    assert_eq!(event["type"], "new_comment");
    leaving.no_pending_events();
}
