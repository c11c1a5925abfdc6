//! Structured logging for publish runs.

use tracing::{error, info, warn, Span};
use vpub_models::JobId;

/// Logs the lifecycle of one publish run with its job id and operation
/// attached to every line.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: &'static str,
}

impl JobLogger {
    /// `operation` is "publish" or "retry_upload".
    pub fn new(job_id: &JobId, operation: &'static str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, operation = self.operation, "Publish started: {}", message);
    }

    pub fn log_stage(&self, stage: &str, message: &str) {
        info!(job_id = %self.job_id, operation = self.operation, stage, "{}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, operation = self.operation, "Publish warning: {}", message);
    }

    pub fn log_error(&self, stage: &str, message: &str) {
        error!(job_id = %self.job_id, operation = self.operation, stage, "Publish failed: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, operation = self.operation, "Publish completed: {}", message);
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Span for everything the run does, stage calls included.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("publish", job_id = %self.job_id, operation = self.operation)
    }
}
