pub mod api;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Inspection endpoints
        .route("/api/filters", get(api::get_filters))
        .route("/api/checkpoint", get(api::get_checkpoint))
        // Health check
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
