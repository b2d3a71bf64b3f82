//! HTTP boundaries in front of the store.
//!
//! - `POST /api/webhook`: ingestion from the Safe Events Service
//! - `GET /api/events`: snapshot, `{"events": [...]}`
//! - `GET /api/events/stream`: the same payload as server-sent events,
//!   pushed after every store mutation
//! - `GET /health`: store statistics

mod auth;
mod error;
pub mod handlers;
mod router;
mod state;

pub use auth::WebhookAuth;
pub use error::AppError;
pub use router::create_router;
pub use state::{AppState, StreamSettings, MIN_KEEP_ALIVE};

use tokio::net::TcpListener;

/// Serve until Ctrl-C.
pub async fn run(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
