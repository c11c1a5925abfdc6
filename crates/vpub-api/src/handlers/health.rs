//! Health and status handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use vpub_pipeline::PipelineState;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Liveness endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Pipeline status response.
#[derive(Serialize)]
pub struct StatusResponse {
    pub busy: bool,
    #[serde(flatten)]
    pub state: PipelineState,
}

/// State of the current or last publish.
pub async fn pipeline_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        busy: state.pipeline.is_busy(),
        state: state.pipeline.state(),
    })
}
