//! Liveness HTTP surface.
//!
//! Two JSON endpoints, enough for a platform health probe and for the
//! keep-alive task to ping. Nothing else is served.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the Axum router with the liveness routes.
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/keep-alive", get(keep_alive))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve the health routes until the process exits.
pub fn spawn_server(port: u16) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(port, error = %e, "Failed to bind health server port");
                return;
            }
        };
        info!(port, "Health server started");
        axum::serve(listener, health_routes()).await.ok();
    })
}

async fn health_check() -> impl IntoResponse {
    info!("Health check ping received");
    Json(serde_json::json!({
        "status": "alive",
        "message": "sheet-relay is running",
        "mode": "relay_bot"
    }))
}

async fn keep_alive() -> impl IntoResponse {
    info!("Keep-alive endpoint hit");
    Json(serde_json::json!({
        "status": "alive",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
