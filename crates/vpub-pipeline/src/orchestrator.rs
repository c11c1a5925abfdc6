//! Publish orchestration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use vpub_media::{MediaError, RenderRequest};
use vpub_models::{CatalogEntry, ErrorKind, ImageSet, JobId, PipelineStage, PublishEvent};
use vpub_youtube::{validate_title, UploadRequest, YouTubeError};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::metrics::{record_completed, record_failed, record_started};
use crate::progress::CompositeProgress;
use crate::stages::{CatalogStage, RenderStage, UploadStage};
use crate::state::PipelineState;

const OP_PUBLISH: &str = "publish";
const OP_RETRY_UPLOAD: &str = "retry_upload";

/// Inputs for one publish run.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub title: String,
    pub images: ImageSet,
    pub duration_secs: f64,
    pub description: String,
    pub tags: Vec<String>,
}

impl PublishRequest {
    pub fn new(title: impl Into<String>, images: ImageSet, duration_secs: f64) -> Self {
        Self {
            title: title.into(),
            images,
            duration_secs,
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

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published {
        remote_id: String,
        /// `None` when the post-publish refresh failed
        catalog: Option<Vec<CatalogEntry>>,
    },
    Failed {
        stage: PipelineStage,
        kind: ErrorKind,
        reason: String,
        /// Set when the upload failed and the rendered file is still on disk
        retry: Option<UploadRequest>,
    },
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, PublishOutcome::Published { .. })
    }

    pub fn remote_id(&self) -> Option<&str> {
        match self {
            PublishOutcome::Published { remote_id, .. } => Some(remote_id),
            PublishOutcome::Failed { .. } => None,
        }
    }

    /// Inputs for [`PublishPipeline::retry_upload`], if the run can be retried.
    pub fn retry_request(&self) -> Option<&UploadRequest> {
        match self {
            PublishOutcome::Failed { retry, .. } => retry.as_ref(),
            PublishOutcome::Published { .. } => None,
        }
    }

    fn terminal_event(&self) -> PublishEvent {
        match self {
            PublishOutcome::Published { remote_id, .. } => PublishEvent::published(remote_id.clone()),
            PublishOutcome::Failed {
                stage,
                kind,
                reason,
                ..
            } => PublishEvent::failed(*stage, *kind, reason.clone()),
        }
    }
}

/// A running publish.
///
/// Events arrive in order and end with exactly one `published` or `failed`
/// event, after which the stream closes. Dropping the handle does not stop
/// the run.
pub struct PublishHandle {
    job_id: JobId,
    events: mpsc::Receiver<PublishEvent>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<PublishOutcome>,
}

impl PublishHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Next event, or `None` once the run has finished.
    pub async fn next_event(&mut self) -> Option<PublishEvent> {
        self.events.recv().await
    }

    /// Ask the run to stop. Rendering is aborted; an upload already in
    /// flight finishes and the run reports a warning instead.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Drain every remaining event and wait for the outcome.
    pub async fn collect(mut self) -> PipelineResult<(Vec<PublishEvent>, PublishOutcome)> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let outcome = self
            .task
            .await
            .map_err(|e| PipelineError::internal(format!("publish task failed: {}", e)))?;
        Ok((events, outcome))
    }

    /// Wait for the outcome, discarding events.
    pub async fn wait(self) -> PipelineResult<PublishOutcome> {
        Ok(self.collect().await?.1)
    }
}

/// Sequences render, upload and catalog refresh.
///
/// Cloning shares the instance: clones see the same state and the same
/// one-run-at-a-time gate.
#[derive(Clone)]
pub struct PublishPipeline {
    inner: Arc<Inner>,
}

struct Inner {
    renderer: Arc<dyn RenderStage>,
    uploader: Arc<dyn UploadStage>,
    catalog: Arc<dyn CatalogStage>,
    config: PipelineConfig,
    busy: AtomicBool,
    state: watch::Sender<PipelineState>,
}

/// Releases the run gate when dropped, including on panic.
struct BusyGuard(Arc<Inner>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::SeqCst);
    }
}

impl PublishPipeline {
    pub fn new(
        renderer: Arc<dyn RenderStage>,
        uploader: Arc<dyn UploadStage>,
        catalog: Arc<dyn CatalogStage>,
        config: PipelineConfig,
    ) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            inner: Arc::new(Inner {
                renderer,
                uploader,
                catalog,
                config,
                busy: AtomicBool::new(false),
                state,
            }),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// Current (or last) run state.
    pub fn state(&self) -> PipelineState {
        self.inner.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    /// Render `request.images` into a video, upload it and refresh the
    /// catalog. Fails fast with [`PipelineError::Busy`] while another run is
    /// in flight.
    pub fn start_publish(&self, request: PublishRequest) -> PipelineResult<PublishHandle> {
        check_title(&request.title)?;
        if !request.duration_secs.is_finite() || request.duration_secs <= 0.0 {
            return Err(PipelineError::validation(format!(
                "duration must be positive, got {}",
                request.duration_secs
            )));
        }

        let guard = self.acquire()?;
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, OP_PUBLISH);
        let (tx, rx) = mpsc::channel(self.inner.config.event_buffer);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let inner = Arc::clone(&self.inner);
        let span = logger.create_span();
        let task = tokio::spawn(
            async move {
                let outcome = inner.publish(&logger, request, &tx, cancel_rx).await;
                finish_run(guard, &tx, outcome).await
            }
            .instrument(span),
        );

        Ok(PublishHandle {
            job_id,
            events: rx,
            cancel: cancel_tx,
            task,
        })
    }

    /// Re-run only the upload (and catalog refresh) for a run that failed at
    /// the upload stage. Progress resumes at the render share.
    pub fn retry_upload(&self, request: UploadRequest) -> PipelineResult<PublishHandle> {
        check_title(&request.title)?;

        let guard = self.acquire()?;
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, OP_RETRY_UPLOAD);
        let (tx, rx) = mpsc::channel(self.inner.config.event_buffer);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let inner = Arc::clone(&self.inner);
        let span = logger.create_span();
        let task = tokio::spawn(
            async move {
                record_started(OP_RETRY_UPLOAD);
                logger.log_start(&format!("retrying upload of {}", request.video_path.display()));
                let started = Instant::now();
                let weight = inner.config.render_weight;
                let progress = Arc::new(CompositeProgress::starting_at(weight, weight, tx.clone()));
                let outcome = inner
                    .upload_and_refresh(&logger, &tx, &progress, request, &cancel_rx, started)
                    .await;
                finish_run(guard, &tx, outcome).await
            }
            .instrument(span),
        );

        Ok(PublishHandle {
            job_id,
            events: rx,
            cancel: cancel_tx,
            task,
        })
    }

    /// Videos currently on the account, read fresh from the platform.
    pub async fn list_catalog(&self) -> PipelineResult<Vec<CatalogEntry>> {
        self.inner.catalog.list().await.map_err(PipelineError::Catalog)
    }

    pub async fn delete_catalog_entry(&self, remote_id: &str) -> PipelineResult<()> {
        self.inner
            .catalog
            .delete(remote_id)
            .await
            .map_err(PipelineError::Catalog)
    }

    fn acquire(&self) -> PipelineResult<BusyGuard> {
        self.inner
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| PipelineError::Busy)?;
        Ok(BusyGuard(Arc::clone(&self.inner)))
    }
}

fn check_title(title: &str) -> PipelineResult<()> {
    validate_title(title).map_err(|e| match e {
        YouTubeError::Validation(msg) => PipelineError::Validation(msg),
        other => PipelineError::validation(other.to_string()),
    })
}

/// Release the gate, then send the terminal event, so a caller reacting to
/// it can start the next run straight away.
async fn finish_run(
    guard: BusyGuard,
    events: &mpsc::Sender<PublishEvent>,
    outcome: PublishOutcome,
) -> PublishOutcome {
    drop(guard);
    let _ = events.send(outcome.terminal_event()).await;
    outcome
}

impl Inner {
    fn set_state(&self, state: PipelineState) {
        self.state.send_replace(state);
    }

    async fn publish(
        &self,
        logger: &JobLogger,
        request: PublishRequest,
        events: &mpsc::Sender<PublishEvent>,
        cancel: watch::Receiver<bool>,
    ) -> PublishOutcome {
        record_started(OP_PUBLISH);
        let started = Instant::now();
        let image_count = request.images.len();
        logger.log_start(&format!(
            "\"{}\" from {} images over {}s",
            request.title, image_count, request.duration_secs
        ));

        let progress = Arc::new(CompositeProgress::new(self.config.render_weight, events.clone()));
        self.set_state(PipelineState::Rendering);
        progress.announce(PipelineStage::Render).await;
        let _ = events
            .send(PublishEvent::log(format!(
                "Rendering {} images, {:.2}s each",
                image_count,
                request.images.per_image_duration(request.duration_secs)
            )))
            .await;

        let render_request =
            RenderRequest::new(request.title.clone(), request.images, request.duration_secs);
        let job = match self
            .renderer
            .render(render_request, progress.render_callback(), cancel.clone())
            .await
        {
            Ok(job) => job,
            Err(e) => {
                return self
                    .fail(logger, events, PipelineError::Render(e), None)
                    .await
            }
        };
        logger.log_stage(
            PipelineStage::Render.as_str(),
            &format!("rendered {}", job.output_path.display()),
        );

        if *cancel.borrow() {
            if let Err(e) = tokio::fs::remove_file(&job.output_path).await {
                logger.log_warning(&format!(
                    "could not remove {}: {}",
                    job.output_path.display(),
                    e
                ));
            }
            return self
                .fail(logger, events, PipelineError::Render(MediaError::Cancelled), None)
                .await;
        }

        let upload_request = UploadRequest::new(job.output_path, request.title)
            .with_description(request.description)
            .with_tags(request.tags);
        self.upload_and_refresh(logger, events, &progress, upload_request, &cancel, started)
            .await
    }

    async fn upload_and_refresh(
        &self,
        logger: &JobLogger,
        events: &mpsc::Sender<PublishEvent>,
        progress: &Arc<CompositeProgress>,
        request: UploadRequest,
        cancel: &watch::Receiver<bool>,
        started: Instant,
    ) -> PublishOutcome {
        self.set_state(PipelineState::Uploading);
        if logger.operation() == OP_RETRY_UPLOAD {
            progress.announce(PipelineStage::Upload).await;
        }
        let _ = events
            .send(PublishEvent::log(format!("Uploading \"{}\"", request.title)))
            .await;

        let remote_id = match self
            .uploader
            .upload(request.clone(), progress.upload_callback())
            .await
        {
            Ok(job) => match job.remote_video_id.filter(|id| !id.is_empty()) {
                Some(id) => id,
                None => {
                    let err = YouTubeError::invalid_response("upload returned no video id");
                    return self
                        .fail(logger, events, PipelineError::Upload(err), Some(request))
                        .await;
                }
            },
            Err(e) => {
                return self
                    .fail(logger, events, PipelineError::Upload(e), Some(request))
                    .await
            }
        };
        logger.log_stage(PipelineStage::Upload.as_str(), &format!("uploaded as {}", remote_id));

        if *cancel.borrow() {
            let message = "cancel requested during upload; the upload completed";
            logger.log_warning(message);
            let _ = events
                .send(PublishEvent::warning(PipelineStage::Upload, message))
                .await;
        }

        self.set_state(PipelineState::Published {
            remote_id: remote_id.clone(),
        });
        progress.finish().await;

        let catalog = match self.catalog.list().await {
            Ok(entries) => {
                let _ = events
                    .send(PublishEvent::catalog_refreshed(entries.clone()))
                    .await;
                Some(entries)
            }
            Err(e) => {
                let message = format!("catalog refresh failed: {}", e);
                logger.log_warning(&message);
                let _ = events
                    .send(PublishEvent::warning(PipelineStage::Catalog, message))
                    .await;
                None
            }
        };

        record_completed(logger.operation(), started.elapsed().as_secs_f64());
        logger.log_completion(&format!("remote id {}", remote_id));

        PublishOutcome::Published { remote_id, catalog }
    }

    async fn fail(
        &self,
        logger: &JobLogger,
        events: &mpsc::Sender<PublishEvent>,
        error: PipelineError,
        retry: Option<UploadRequest>,
    ) -> PublishOutcome {
        let stage = error.stage().unwrap_or(PipelineStage::Render);
        let kind = error.kind();
        let reason = error.to_string();

        logger.log_error(stage.as_str(), &reason);
        record_failed(logger.operation(), stage, kind);
        if let Some(request) = &retry {
            let _ = events
                .send(PublishEvent::log(format!(
                    "Rendered file kept for retry: {}",
                    request.video_path.display()
                )))
                .await;
        }
        self.set_state(PipelineState::Failed {
            stage,
            kind,
            reason: reason.clone(),
        });

        PublishOutcome::Failed {
            stage,
            kind,
            reason,
            retry,
        }
    }
}
