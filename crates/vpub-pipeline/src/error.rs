//! Pipeline error types.

use thiserror::Error;
use vpub_media::MediaError;
use vpub_models::{ErrorKind, PipelineStage};
use vpub_youtube::YouTubeError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("A publish is already in progress")]
    Busy,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Render failed: {0}")]
    Render(#[from] MediaError),

    #[error("Upload failed: {0}")]
    Upload(#[source] YouTubeError),

    #[error("Catalog request failed: {0}")]
    Catalog(#[source] YouTubeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, PipelineError::Busy)
    }

    /// Stage the error came from, if any.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            PipelineError::Render(_) => Some(PipelineStage::Render),
            PipelineError::Upload(_) => Some(PipelineStage::Upload),
            PipelineError::Catalog(_) => Some(PipelineStage::Catalog),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Render(e) => e.kind(),
            PipelineError::Upload(e) | PipelineError::Catalog(e) => e.kind(),
            PipelineError::Busy | PipelineError::Internal(_) => ErrorKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_stage() {
        let err = PipelineError::Catalog(YouTubeError::NotFound("abc".into()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.stage(), Some(PipelineStage::Catalog));

        let err = PipelineError::from(MediaError::Cancelled);
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.stage(), Some(PipelineStage::Render));

        assert!(PipelineError::Busy.is_busy());
        assert_eq!(PipelineError::Busy.stage(), None);
    }
}
