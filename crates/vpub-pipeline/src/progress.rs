//! Composite progress across render and upload.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use vpub_models::{PercentCallback, PipelineStage, PublishEvent};

use crate::metrics::record_progress_dropped;

/// Highest composite value before the run is published.
const CAP_BEFORE_PUBLISHED: u8 = 99;

/// Maps stage percents onto one pipeline-wide 0-100 scale.
///
/// Render covers `[0, render_weight]` and upload `[render_weight, 100]`.
/// Values never decrease and stay at or below 99 until [`Self::finish`]
/// sends the single 100.
pub struct CompositeProgress {
    render_weight: u8,
    last: AtomicU8,
    events: mpsc::Sender<PublishEvent>,
}

impl CompositeProgress {
    pub fn new(render_weight: u8, events: mpsc::Sender<PublishEvent>) -> Self {
        Self::starting_at(render_weight, 0, events)
    }

    /// Start from `initial`, used when only the upload is re-run.
    pub fn starting_at(render_weight: u8, initial: u8, events: mpsc::Sender<PublishEvent>) -> Self {
        Self {
            render_weight: render_weight.clamp(1, 99),
            last: AtomicU8::new(initial.min(CAP_BEFORE_PUBLISHED)),
            events,
        }
    }

    pub fn render_weight(&self) -> u8 {
        self.render_weight
    }

    pub fn current(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }

    /// Emit the current value for `stage` unconditionally.
    pub async fn announce(&self, stage: PipelineStage) {
        let _ = self
            .events
            .send(PublishEvent::progress(stage, self.current()))
            .await;
    }

    pub fn scale_render(&self, percent: u8) -> u8 {
        (percent.min(100) as u32 * self.render_weight as u32 / 100) as u8
    }

    pub fn scale_upload(&self, percent: u8) -> u8 {
        let span = 100 - self.render_weight as u32;
        (self.render_weight as u32 + percent.min(100) as u32 * span / 100) as u8
    }

    /// Callback for the renderer.
    pub fn render_callback(self: &Arc<Self>) -> PercentCallback {
        let this = Arc::clone(self);
        Arc::new(move |p| {
            this.report(PipelineStage::Render, this.scale_render(p));
        })
    }

    /// Callback for the uploader.
    pub fn upload_callback(self: &Arc<Self>) -> PercentCallback {
        let this = Arc::clone(self);
        Arc::new(move |p| {
            this.report(PipelineStage::Upload, this.scale_upload(p));
        })
    }

    /// Record a composite value. Called from synchronous stage callbacks, so
    /// the event is offered without waiting; a lagging consumer misses
    /// intermediate values but never sees them out of order.
    pub fn report(&self, stage: PipelineStage, value: u8) -> bool {
        let value = value.min(CAP_BEFORE_PUBLISHED);
        let previous = self.last.fetch_max(value, Ordering::SeqCst);
        if value <= previous {
            return false;
        }
        if self
            .events
            .try_send(PublishEvent::progress(stage, value))
            .is_err()
        {
            record_progress_dropped();
        }
        true
    }

    /// Send the single 100.
    pub async fn finish(&self) {
        self.last.store(100, Ordering::SeqCst);
        let _ = self
            .events
            .send(PublishEvent::progress(PipelineStage::Upload, 100))
            .await;
    }
}
