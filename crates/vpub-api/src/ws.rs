//! WebSocket handlers that run a publish and stream its events.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vpub_models::{ImageRef, ImageSet, PublishEvent};
use vpub_pipeline::{PublishHandle, PublishRequest};
use vpub_youtube::UploadRequest;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::paths::AllowedDirs;
use crate::state::AppState;

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// How long a client has to send its request after connecting.
const WS_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_DURATION_SECS: f64 = 60.0;

fn default_duration() -> f64 {
    DEFAULT_DURATION_SECS
}

/// First message on `/ws/publish`.
#[derive(Debug, Deserialize)]
pub struct WsPublishRequest {
    pub title: String,
    pub images: Vec<ImageRef>,
    /// Total video length in seconds
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl WsPublishRequest {
    /// Every image must resolve to a file in the staging directory.
    pub fn into_publish_request(self, dirs: &AllowedDirs) -> ApiResult<PublishRequest> {
        let images = self
            .images
            .into_iter()
            .map(|image| -> ApiResult<ImageRef> {
                let path = dirs.image(image.path())?;
                Ok(ImageRef::new(image.id, path))
            })
            .collect::<ApiResult<Vec<_>>>()?;
        let images = ImageSet::new(images).map_err(|e| ApiError::bad_request(e.to_string()))?;
        Ok(PublishRequest::new(self.title, images, self.duration)
            .with_description(self.description)
            .with_tags(self.tags))
    }
}

/// First message on `/ws/retry-upload`, built from a failed run's log.
#[derive(Debug, Deserialize)]
pub struct WsRetryRequest {
    pub video_path: PathBuf,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl WsRetryRequest {
    /// The video must resolve to an `.mp4` in the render output directory.
    pub fn into_upload_request(self, dirs: &AllowedDirs) -> ApiResult<UploadRequest> {
        let video_path = dirs.video(&self.video_path)?;
        Ok(UploadRequest::new(video_path, self.title)
            .with_description(self.description)
            .with_tags(self.tags))
    }
}

/// Messages a client may send while a run is streaming.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsControl {
    Cancel,
}

/// Sent instead of an event stream when a run could not start.
#[derive(Serialize)]
struct WsError {
    #[serde(rename = "type")]
    message_type: &'static str,
    detail: String,
    code: &'static str,
}

type WsSender = SplitSink<WebSocket, Message>;

/// WebSocket publish endpoint.
pub async fn ws_publish(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    connection_opened("publish");

    ws.on_upgrade(|socket| async move {
        let pipeline = state.pipeline.clone();
        let dirs = state.dirs.clone();
        handle_socket(socket, "publish", move |request: WsPublishRequest| {
            let request = request.into_publish_request(&dirs)?;
            Ok(pipeline.start_publish(request)?)
        })
        .await;
        connection_closed();
    })
}

/// WebSocket endpoint that re-runs only the upload of a failed publish.
pub async fn ws_retry_upload(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    connection_opened("retry_upload");

    ws.on_upgrade(|socket| async move {
        let pipeline = state.pipeline.clone();
        let dirs = state.dirs.clone();
        handle_socket(socket, "retry_upload", move |request: WsRetryRequest| {
            let request = request.into_upload_request(&dirs)?;
            Ok(pipeline.retry_upload(request)?)
        })
        .await;
        connection_closed();
    })
}

fn connection_opened(endpoint: &str) {
    let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_ws_active_connections(count);
    metrics::record_ws_connection(endpoint);
}

fn connection_closed() {
    let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
    metrics::set_ws_active_connections(count);
}

/// Read one request, start the run, then forward events until the terminal
/// one. A client that disconnects or sends `{"type":"cancel"}` cancels the run.
async fn handle_socket<R, F>(socket: WebSocket, endpoint: &'static str, start: F)
where
    R: DeserializeOwned,
    F: FnOnce(R) -> ApiResult<PublishHandle>,
{
    let (mut sender, mut receiver) = socket.split();

    let request: R = match tokio::time::timeout(WS_CLIENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => {
            metrics::record_ws_message_received(endpoint);
            match serde_json::from_str(&text) {
                Ok(request) => request,
                Err(e) => {
                    let err = ApiError::bad_request(format!("Invalid request: {}", e));
                    close_with_error(&mut sender, err).await;
                    return;
                }
            }
        }
        Ok(_) | Err(_) => {
            let err = ApiError::bad_request("Expected JSON message or connection timeout");
            close_with_error(&mut sender, err).await;
            return;
        }
    };

    let mut handle = match start(request) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(endpoint, error = %e, "Publish rejected");
            close_with_error(&mut sender, e).await;
            return;
        }
    };
    info!(endpoint, job_id = %handle.job_id(), "WebSocket run started");

    loop {
        tokio::select! {
            event = handle.next_event() => {
                let Some(event) = event else { break };
                let terminal = event.is_terminal();
                if !send_event(&mut sender, endpoint, &event).await {
                    debug!(job_id = %handle.job_id(), "Client gone, cancelling run");
                    handle.cancel();
                    return;
                }
                if terminal {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    metrics::record_ws_message_received(endpoint);
                    match serde_json::from_str::<WsControl>(&text) {
                        Ok(WsControl::Cancel) => {
                            info!(job_id = %handle.job_id(), "Cancel requested by client");
                            handle.cancel();
                        }
                        Err(e) => debug!(error = %e, "Ignoring unknown client message"),
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    info!(job_id = %handle.job_id(), "Client disconnected, cancelling run");
                    handle.cancel();
                    return;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

async fn send_event(sender: &mut WsSender, endpoint: &str, event: &PublishEvent) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to serialize publish event");
            return true;
        }
    };
    metrics::record_ws_message_sent(endpoint, event.event_type().as_str());
    sender.send(Message::Text(json)).await.is_ok()
}

async fn close_with_error(sender: &mut WsSender, err: ApiError) {
    let body = WsError {
        message_type: "error",
        detail: err.to_string(),
        code: err.code(),
    };
    if let Ok(json) = serde_json::to_string(&body) {
        let _ = sender.send(Message::Text(json)).await;
    }
    let _ = sender.send(Message::Close(None)).await;
}
