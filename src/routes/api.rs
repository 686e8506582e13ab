use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use lode_core::Checkpoint;

use crate::models::{GetCheckpointResponse, GetFiltersResponse};
use crate::state::AppState;

/// GET /api/filters - Show the configured filters and the SQL they compile to.
pub async fn get_filters(State(state): State<AppState>) -> Response {
    let response = GetFiltersResponse {
        connector: state.connector.to_string(),
        exclusion: state.compiled.exclusion.to_sql(&state.dialect),
        inclusion: state.compiled.inclusion.to_sql(&state.dialect),
        config: state.filters.as_ref().clone(),
    };
    Json(response).into_response()
}

/// GET /api/checkpoint - Show the last committed checkpoint.
pub async fn get_checkpoint(State(state): State<AppState>) -> Response {
    match state.checkpoint_store.load(&state.connector) {
        Ok(checkpoint) => {
            let position = checkpoint
                .as_deref()
                .and_then(|encoded| Checkpoint::decode(encoded).ok())
                .and_then(|checkpoint| checkpoint.cursor());
            let response = GetCheckpointResponse {
                connector: state.connector.to_string(),
                checkpoint,
                position,
            };
            Json(response).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to load checkpoint: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {}", e),
            )
                .into_response()
        }
    }
}
