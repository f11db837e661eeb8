//! API Routes
//!
//! Configures the Axum router with all URL service endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, invalidate_handler, redirect_handler, resolve_handler, shorten_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/resolve/:code", get(resolve_handler))
        .route("/cache/:code", delete(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .route("/:code", get(redirect_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
