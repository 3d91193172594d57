use anyhow::{Context, Result};
use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use super::api::{self, SharedState};

/// Configuration for the local board server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3141,
            dev_mode: false,
        }
    }
}

impl ServerConfig {
    /// Dev mode listens on every interface so a front-end dev server in a
    /// container can reach it.
    pub fn bind_addr(&self) -> String {
        let host = if self.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
        format!("{}:{}", host, self.port)
    }
}

/// Build the full application router.
pub fn build_router(state: SharedState) -> Router {
    api::api_router().fallback(not_found).with_state(state)
}

async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("No route for {}", uri.path())})),
    )
        .into_response()
}

/// Serve the board until Ctrl+C.
pub async fn start_server(config: ServerConfig, state: SharedState) -> Result<()> {
    let mut app = build_router(state);
    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(%local_addr, dev = config.dev_mode, "board server listening");
    println!("Taskflow board running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}
