//! Pipeline metrics.

use metrics::{counter, histogram};
use vpub_models::{ErrorKind, PipelineStage};

pub mod names {
    pub const PUBLISHES_STARTED_TOTAL: &str = "vpub_publishes_started_total";
    pub const PUBLISHES_COMPLETED_TOTAL: &str = "vpub_publishes_completed_total";
    pub const PUBLISHES_FAILED_TOTAL: &str = "vpub_publishes_failed_total";
    pub const PUBLISH_DURATION_SECONDS: &str = "vpub_publish_duration_seconds";
    /// Progress events skipped because the consumer lagged
    pub const PROGRESS_DROPPED_TOTAL: &str = "vpub_progress_events_dropped_total";
}

pub fn record_started(operation: &'static str) {
    counter!(names::PUBLISHES_STARTED_TOTAL, "operation" => operation).increment(1);
}

pub fn record_completed(operation: &'static str, duration_secs: f64) {
    counter!(names::PUBLISHES_COMPLETED_TOTAL, "operation" => operation).increment(1);
    histogram!(names::PUBLISH_DURATION_SECONDS, "operation" => operation).record(duration_secs);
}

pub fn record_failed(operation: &'static str, stage: PipelineStage, kind: ErrorKind) {
    counter!(
        names::PUBLISHES_FAILED_TOTAL,
        "operation" => operation,
        "stage" => stage.as_str(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

pub fn record_progress_dropped() {
    counter!(names::PROGRESS_DROPPED_TOTAL).increment(1);
}
