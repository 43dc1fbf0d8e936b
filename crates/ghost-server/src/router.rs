use std::sync::Arc;

use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::state::AppState;

const ALLOWED_HEADERS: &[&str] =
    &["authorization", "content-type", "x-client-info", "apikey", "x-ghost-batch-id", "x-ghost-device"];

/// Builds the router with every §6 route installed plus permissive CORS for
/// the dashboard/extension origins — `IHP-main`'s `build_router` shape
/// (`Router::new().route(...).with_state(Arc<state>)`), enriched with the
/// `tower_http` CORS layer this spec's preflight contract needs.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(tower_http::cors::Any)
        .allow_headers(ALLOWED_HEADERS.iter().map(|h| h.parse::<HeaderValue>().expect("static header name")).collect::<Vec<_>>());

    Router::new()
        .route("/ingest-events", post(handlers::ingest_events))
        .route("/pattern-detector", post(handlers::pattern_detector))
        .route("/ghost-executor", post(handlers::ghost_executor))
        .route("/approve-ghost", post(handlers::approve_ghost))
        .layer(cors)
        .with_state(state)
        .fallback(|| async { StatusCode::NOT_FOUND })
}
