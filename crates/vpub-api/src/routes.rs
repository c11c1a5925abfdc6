//! API routes.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{delete_video, health, list_videos, pipeline_status, search_images};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;
use crate::ws::{ws_publish, ws_retry_upload};

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route("/search", post(search_images))
        .route("/videos", get(list_videos))
        .route("/videos/:video_id", delete(delete_video))
        .route("/status", get(pipeline_status));

    let ws_routes = Router::new()
        .route("/ws/publish", get(ws_publish))
        .route("/ws/retry-upload", get(ws_retry_upload));

    let health_routes = Router::new().route("/health", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tokio::sync::watch;
    use tower::ServiceExt;
    use vpub_media::{MediaError, MediaResult, RenderRequest};
    use vpub_models::{CatalogEntry, ImageRef, PercentCallback, RenderJob, UploadJob};
    use vpub_pipeline::{CatalogStage, PipelineConfig, PublishPipeline, RenderStage, UploadStage};
    use vpub_search::{ImageSearch, SearchError, SearchResult};
    use vpub_youtube::{UploadRequest, YouTubeError, YouTubeResult};

    use crate::config::ApiConfig;
    use crate::paths::AllowedDirs;

    struct NoRender;

    #[async_trait]
    impl RenderStage for NoRender {
        async fn render(
            &self,
            _request: RenderRequest,
            _on_progress: PercentCallback,
            _cancel: watch::Receiver<bool>,
        ) -> MediaResult<RenderJob> {
            Err(MediaError::internal("not used"))
        }
    }

    struct NoUpload;

    #[async_trait]
    impl UploadStage for NoUpload {
        async fn upload(
            &self,
            _request: UploadRequest,
            _on_progress: PercentCallback,
        ) -> YouTubeResult<UploadJob> {
            Err(YouTubeError::RequestFailed("not used".into()))
        }
    }

    struct MemoryCatalog {
        entries: Mutex<Vec<CatalogEntry>>,
        authenticated: bool,
    }

    #[async_trait]
    impl CatalogStage for MemoryCatalog {
        async fn list(&self) -> YouTubeResult<Vec<CatalogEntry>> {
            if !self.authenticated {
                return Err(YouTubeError::Unauthenticated("no token".into()));
            }
            Ok(self.entries.lock().unwrap().clone())
        }

        async fn delete(&self, remote_id: &str) -> YouTubeResult<()> {
            if !self.authenticated {
                return Err(YouTubeError::Unauthenticated("no token".into()));
            }
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| e.remote_id != remote_id);
            if entries.len() == before {
                return Err(YouTubeError::NotFound(remote_id.to_string()));
            }
            Ok(())
        }
    }

    struct FixedSearch;

    #[async_trait]
    impl ImageSearch for FixedSearch {
        async fn search(&self, query: &str) -> SearchResult<Vec<ImageRef>> {
            if query.trim().is_empty() {
                return Err(SearchError::validation("search query must not be empty"));
            }
            Ok(vec![ImageRef::new("p1", "/stage/p1.jpg")])
        }
    }

    fn app(authenticated: bool) -> Router {
        let catalog = MemoryCatalog {
            entries: Mutex::new(vec![
                CatalogEntry::new("new", "Newest"),
                CatalogEntry::new("old", "Oldest"),
            ]),
            authenticated,
        };
        let pipeline = PublishPipeline::new(
            Arc::new(NoRender),
            Arc::new(NoUpload),
            Arc::new(catalog),
            PipelineConfig::default(),
        );
        let state = AppState::new(
            ApiConfig::default(),
            pipeline,
            Arc::new(FixedSearch),
            AllowedDirs::new("/stage", "/output"),
        );
        create_router(state, None)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn delete_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(true).oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_list_videos() {
        let (status, body) = send(app(true), get_request("/api/videos")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["videos"][0]["remoteId"], "new");
        assert_eq!(body["videos"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_videos_unauthenticated() {
        let (status, body) = send(app(false), get_request("/api/videos")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_delete_video_then_not_found() {
        let app = app(true);
        let (status, _) = send(app.clone(), delete_request("/api/videos/old")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(app, delete_request("/api/videos/old")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn test_search_images() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query": "sunset"}"#))
            .unwrap();
        let (status, body) = send(app(true), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["images"][0]["id"], "p1");
        assert_eq!(body["images"][0]["path"], "/stage/p1.jpg");
    }

    #[tokio::test]
    async fn test_blank_search_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query": "  "}"#))
            .unwrap();
        let (status, body) = send(app(true), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_status_starts_idle() {
        let (status, body) = send(app(true), get_request("/api/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "idle");
        assert_eq!(body["busy"], false);
    }
}
