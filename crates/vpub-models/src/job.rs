//! Render and upload job definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};
use crate::image::ImageSet;

/// Unique identifier for a publish job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// Created, encoder not started
    #[default]
    Pending,
    /// Encoder running
    Rendering,
    /// Output file written
    Rendered,
}

impl RenderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderState::Pending => "pending",
            RenderState::Rendering => "rendering",
            RenderState::Rendered => "rendered",
        }
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to compose one image set into one video file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderJob {
    pub id: JobId,
    pub title: String,
    pub images: ImageSet,
    pub total_duration_secs: f64,
    /// Computed once from the total duration and the image count
    pub per_image_secs: f64,
    pub output_path: PathBuf,
    #[serde(default)]
    pub state: RenderState,
    #[serde(default)]
    pub percent_complete: u8,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RenderJob {
    /// Create a pending render job.
    pub fn new(
        title: impl Into<String>,
        images: ImageSet,
        total_duration_secs: f64,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        let per_image_secs = images.per_image_duration(total_duration_secs);
        Self {
            id: JobId::new(),
            title: title.into(),
            images,
            total_duration_secs,
            per_image_secs,
            output_path: output_path.into(),
            state: RenderState::Pending,
            percent_complete: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn transition(&mut self, to: RenderState) -> ModelResult<()> {
        let allowed = matches!(
            (self.state, to),
            (RenderState::Pending, RenderState::Rendering)
                | (RenderState::Rendering, RenderState::Rendered)
        );
        if !allowed {
            return Err(ModelError::InvalidTransition {
                entity: "render job",
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Mark the encoder as started.
    pub fn start(&mut self) -> ModelResult<()> {
        self.transition(RenderState::Rendering)
    }

    /// Record encoder progress. Never moves backwards.
    pub fn set_progress(&mut self, percent: u8) {
        self.percent_complete = self.percent_complete.max(percent.min(100));
    }

    /// Mark the output file as written.
    pub fn complete(&mut self) -> ModelResult<()> {
        self.transition(RenderState::Rendered)?;
        self.percent_complete = 100;
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

/// Upload job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    /// Created, no bytes sent
    #[default]
    Pending,
    /// Streaming bytes to the platform
    Uploading,
    /// Remote video created
    Uploaded,
}

impl UploadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadState::Pending => "pending",
            UploadState::Uploading => "uploading",
            UploadState::Uploaded => "uploaded",
        }
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to publish one local video file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadJob {
    pub id: JobId,
    pub video_path: PathBuf,
    pub title: String,
    #[serde(default)]
    pub percent_complete: u8,
    #[serde(default)]
    pub state: UploadState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_video_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl UploadJob {
    /// Create a pending upload job.
    pub fn new(video_path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            video_path: video_path.into(),
            title: title.into(),
            percent_complete: 0,
            state: UploadState::Pending,
            remote_video_id: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn transition(&mut self, to: UploadState) -> ModelResult<()> {
        let allowed = matches!(
            (self.state, to),
            (UploadState::Pending, UploadState::Uploading)
                | (UploadState::Uploading, UploadState::Uploaded)
        );
        if !allowed {
            return Err(ModelError::InvalidTransition {
                entity: "upload job",
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Mark the stream as started.
    pub fn start(&mut self) -> ModelResult<()> {
        self.transition(UploadState::Uploading)
    }

    /// Record upload progress. Never moves backwards.
    pub fn set_progress(&mut self, percent: u8) {
        self.percent_complete = self.percent_complete.max(percent.min(100));
    }

    /// Mark the upload as accepted by the platform.
    pub fn complete(&mut self, remote_video_id: impl Into<String>) -> ModelResult<()> {
        let remote_video_id = remote_video_id.into();
        if remote_video_id.is_empty() {
            return Err(ModelError::validation("remote video id must not be empty"));
        }
        self.transition(UploadState::Uploaded)?;
        self.remote_video_id = Some(remote_video_id);
        self.percent_complete = 100;
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}
