//! §6 external interfaces: ingestion, pattern detection, execution, and
//! approval endpoints behind a shared envelope and CORS policy.

pub mod envelope;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;

use std::net::SocketAddr;

/// Binds and serves the router — the convenience entry point `ghost-cli`'s
/// `serve` subcommand calls.
pub async fn run(state: std::sync::Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::build_router(state)).await
}
