//! Image search handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use vpub_models::ImageRef;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub images: Vec<ImageRef>,
}

/// Search for images and stage them for a publish.
pub async fn search_images(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let images = state.search.search(&request.query).await?;
    Ok(Json(SearchResponse { images }))
}
