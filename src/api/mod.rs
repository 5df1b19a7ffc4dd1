mod errors;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use errors::{AppError, ErrorResponse};

use crate::engine::NotificationRelay;

/// Shared application state accessible by all handlers.
pub struct AppState {
    pub relay: Arc<NotificationRelay>,
    /// Client used to confirm SNS subscriptions.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(relay: NotificationRelay) -> Self {
        Self {
            relay: Arc::new(relay),
            http: reqwest::Client::new(),
        }
    }
}

/// All routes, without the body limit and outer layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sns", post(handlers::receive_sns))
        .route("/events", post(handlers::receive_events))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(host: &str, port: u16, relay: NotificationRelay, max_body: usize) -> Result<()> {
    let state = Arc::new(AppState::new(relay));

    let app = router(state)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("pipewatch listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
