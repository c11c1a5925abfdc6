//! Publish run state machine.

use serde::{Deserialize, Serialize};
use vpub_models::{ErrorKind, PipelineStage};

/// Where the pipeline is in its current (or last) run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    Rendering,
    Uploading,
    Published {
        remote_id: String,
    },
    Failed {
        stage: PipelineStage,
        kind: ErrorKind,
        reason: String,
    },
}

impl PipelineState {
    /// A run is between `start_publish` and its terminal event.
    pub fn is_active(&self) -> bool {
        matches!(self, PipelineState::Rendering | PipelineState::Uploading)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Rendering => "rendering",
            PipelineState::Uploading => "uploading",
            PipelineState::Published { .. } => "published",
            PipelineState::Failed { .. } => "failed",
        }
    }
}
