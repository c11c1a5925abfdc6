//! Catalog handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use vpub_models::CatalogEntry;

use crate::error::ApiResult;
use crate::state::AppState;

/// Catalog listing response.
#[derive(Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<CatalogEntry>,
}

/// List the account's videos, newest first.
pub async fn list_videos(State(state): State<AppState>) -> ApiResult<Json<VideoListResponse>> {
    let videos = state.pipeline.list_catalog().await?;
    Ok(Json(VideoListResponse { videos }))
}

/// Delete one video from the account.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.pipeline.delete_catalog_entry(&video_id).await?;
    info!(video_id = %video_id, "Video deleted via API");
    Ok(StatusCode::NO_CONTENT)
}
