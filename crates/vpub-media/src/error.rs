//! Error types for rendering.

use std::path::PathBuf;
use thiserror::Error;
use vpub_models::{ErrorKind, ModelError};

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Image {image_id} not found at {}", path.display())]
    MissingInput { image_id: String, path: PathBuf },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn missing_input(image_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingInput {
            image_id: image_id.into(),
            path: path.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Encoder stderr tail, when the failure came from FFmpeg.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            MediaError::FfmpegFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MediaError::FfmpegNotFound | MediaError::FfmpegFailed { .. } => ErrorKind::Encoding,
            MediaError::Validation(_) => ErrorKind::Validation,
            MediaError::MissingInput { .. } => ErrorKind::MissingInput,
            MediaError::Cancelled => ErrorKind::Cancelled,
            MediaError::Timeout(_) => ErrorKind::Timeout,
            MediaError::Model(e) => e.kind(),
            MediaError::Io(_) | MediaError::Internal(_) => ErrorKind::Unknown,
        }
    }
}
