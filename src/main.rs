//! Realtime server entry point.
//!
//! Boots configuration, the Postgres pool, and the WebSocket endpoint.

use std::sync::Arc;

use axum::routing::get;
use http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use museup_realtime::adapters::auth::JwtTokenVerifier;
use museup_realtime::adapters::postgres::{
    PostgresCommentStore, PostgresConversationStore, PostgresMessageStore,
    PostgresProfileReader,
};
use museup_realtime::adapters::websocket::{
    websocket_router, ConnectionRegistry, WebSocketState,
};
use museup_realtime::application::{ChatService, CommentService};
use museup_realtime::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(environment = ?config.server.environment, "starting realtime server");

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let registry = Arc::new(ConnectionRegistry::new());
    let chat = Arc::new(ChatService::new(
        Arc::new(PostgresConversationStore::new(pool.clone())),
        Arc::new(PostgresMessageStore::new(pool.clone())),
        Arc::new(PostgresProfileReader::new(pool.clone())),
        registry.clone(),
    ));
    let comments = Arc::new(CommentService::new(
        Arc::new(PostgresCommentStore::new(pool.clone())),
        registry.clone(),
    ));
    let state = WebSocketState {
        registry,
        chat,
        comments,
        verifier: Arc::new(JwtTokenVerifier::new(&config.auth.jwt_secret)),
        max_frame_bytes: config.websocket.max_frame_bytes,
    };

    let cors = cors_layer(&config.server.cors_origins_list());
    let app = websocket_router()
        .with_state(state)
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    let addr = config.server.socket_addr();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring unparseable CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
