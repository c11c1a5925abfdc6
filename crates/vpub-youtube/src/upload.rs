//! Video upload via a single `multipart/related` insert.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client};
use tokio_util::io::ReaderStream;
use tracing::{info, info_span, warn, Instrument};
use vpub_models::{MonotonicPercent, PercentCallback, UploadJob};

use crate::config::YouTubeConfig;
use crate::credential::{usable_credential, CredentialStore};
use crate::error::{YouTubeError, YouTubeResult};
use crate::metrics::{record_request, record_upload_bytes};
use crate::types::{Video, VideoInsert};

/// Longest title the platform accepts.
pub const MAX_TITLE_CHARS: usize = 100;

/// Inputs for one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub video_path: PathBuf,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl UploadRequest {
    pub fn new(video_path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            video_path: video_path.into(),
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Reject titles the platform would refuse.
pub fn validate_title(title: &str) -> YouTubeResult<()> {
    if title.trim().is_empty() {
        return Err(YouTubeError::validation("title must not be empty"));
    }
    let chars = title.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(YouTubeError::validation(format!(
            "title is {} characters, the limit is {}",
            chars, MAX_TITLE_CHARS
        )));
    }
    if title.contains('<') || title.contains('>') {
        return Err(YouTubeError::validation("title must not contain '<' or '>'"));
    }
    Ok(())
}

/// Streams rendered videos to the platform.
#[derive(Clone)]
pub struct Uploader {
    http: Client,
    config: YouTubeConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl Uploader {
    pub fn new(config: YouTubeConfig, credentials: Arc<dyn CredentialStore>) -> YouTubeResult<Self> {
        // No client-wide timeout: the whole request is bounded by
        // `upload_timeout` instead.
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("vpub-youtube/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(YouTubeError::Network)?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &YouTubeConfig {
        &self.config
    }

    /// Upload `request.video_path` and return the finished job.
    ///
    /// Percent complete is bytes handed to the transport over file size. On
    /// success the local file is deleted; on any failure it is left in place.
    pub async fn upload(
        &self,
        request: UploadRequest,
        on_progress: PercentCallback,
    ) -> YouTubeResult<UploadJob> {
        validate_title(&request.title)?;

        let size = match tokio::fs::metadata(&request.video_path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(YouTubeError::MissingInput(request.video_path.clone())),
        };
        if size == 0 {
            return Err(YouTubeError::validation("video file is empty"));
        }

        let credential = usable_credential(self.credentials.as_ref()).await?;

        let mut job = UploadJob::new(&request.video_path, &request.title);
        job.start()?;

        let span = info_span!("youtube_upload", job_id = %job.id, bytes = size);
        let started = Instant::now();

        let result = tokio::time::timeout(
            self.config.upload_timeout,
            self.send_insert(&request, &credential.access_token, size, on_progress)
                .instrument(span.clone()),
        )
        .await
        .unwrap_or_else(|_| Err(YouTubeError::Timeout(self.config.upload_timeout.as_secs())));

        let latency = started.elapsed().as_secs_f64();
        let video = match result {
            Ok(video) => {
                record_request("upload", 200, latency);
                video
            }
            Err(e) => {
                record_request("upload", e.http_status().unwrap_or(0), latency);
                span.in_scope(|| warn!(error = %e, "Upload failed, keeping local file"));
                return Err(e);
            }
        };

        if video.id.trim().is_empty() {
            return Err(YouTubeError::invalid_response("insert response has no video id"));
        }

        job.complete(video.id.clone())?;
        record_upload_bytes(size);

        if let Err(e) = tokio::fs::remove_file(&request.video_path).await {
            warn!(
                path = %request.video_path.display(),
                error = %e,
                "Uploaded video could not be deleted"
            );
        }

        span.in_scope(|| info!(remote_id = %video.id, elapsed_secs = latency, "Upload completed"));
        Ok(job)
    }

    async fn send_insert(
        &self,
        request: &UploadRequest,
        access_token: &str,
        size: u64,
        on_progress: PercentCallback,
    ) -> YouTubeResult<Video> {
        let metadata = VideoInsert::new(
            &request.title,
            &request.description,
            &request.tags,
            &self.config.publish,
        );
        let boundary = format!("vpub-{}", uuid::Uuid::new_v4().simple());
        let head = Bytes::from(format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{json}\r\n\
             --{b}\r\nContent-Type: video/mp4\r\n\r\n",
            b = boundary,
            json = serde_json::to_string(&metadata)?,
        ));
        let tail = Bytes::from(format!("\r\n--{}--\r\n", boundary));
        let content_length = head.len() as u64 + size + tail.len() as u64;

        let file = tokio::fs::File::open(&request.video_path)
            .await
            .map_err(|_| YouTubeError::MissingInput(request.video_path.clone()))?;

        let progress = Arc::new(MonotonicPercent::new(on_progress));
        progress.report(0);
        let mut sent: u64 = 0;
        let media = ReaderStream::with_capacity(file, self.config.upload_chunk_size).map(
            move |chunk| {
                if let Ok(bytes) = &chunk {
                    sent += bytes.len() as u64;
                    progress.report(upload_percent(sent, size));
                }
                chunk
            },
        );

        let body_stream = stream::once(async move { Ok::<Bytes, std::io::Error>(head) })
            .chain(media)
            .chain(stream::once(async move { Ok(tail) }));

        let url = format!("{}/videos", self.config.upload_base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("uploadType", "multipart"), ("part", "snippet,status")])
            .bearer_auth(access_token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .header(CONTENT_LENGTH, content_length)
            .body(Body::wrap_stream(body_stream))
            .send()
            .await
            .map_err(|e| YouTubeError::transport(e, self.config.upload_timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| YouTubeError::transport(e, self.config.upload_timeout))?;

        if !status.is_success() {
            return Err(YouTubeError::from_http_status(status.as_u16(), text));
        }

        serde_json::from_str::<Video>(&text)
            .map_err(|e| YouTubeError::invalid_response(format!("insert response: {}", e)))
    }
}

/// Whole percent of `sent` over `total`; 100 only once everything is sent.
fn upload_percent(sent: u64, total: u64) -> u8 {
    if total == 0 || sent >= total {
        return 100;
    }
    ((sent.saturating_mul(100)) / total).min(99) as u8
}
