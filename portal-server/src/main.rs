//! Incident Portal MCP endpoint binary.
//!
//! Serves the session-less MCP surface over HTTP. Configuration comes from
//! the environment: `MCP_AUTH_SECRET` for endpoint auth, `PORT` for the
//! listen port, and the `FIRESTORE_*`/`GOOGLE_APPLICATION_CREDENTIALS`
//! variables for the store (read lazily on first tool call).

use std::net::SocketAddr;

use portal_server::endpoint::{router, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = AppState::from_env();
    if state.secret.is_none() {
        warn!("MCP_AUTH_SECRET is not set; every request will be rejected with 503");
    }

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Incident portal MCP endpoint listening on {}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}
