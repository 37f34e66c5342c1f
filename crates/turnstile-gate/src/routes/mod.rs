//! HTTP route handlers for the gate service.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod gate;
mod health;

/// Create the main application router.
///
/// Every path other than `/health` is a forward-auth check.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))

        // Forward-auth: any method, any path
        .fallback(gate::gate_request)

        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}
