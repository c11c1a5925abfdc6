//! Shared data models for the vpub publish pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Image references and ordered image sets
//! - Render and upload jobs with their state machines
//! - Catalog entries and credentials
//! - Encoding constants for the vertical output format
//! - Publish progress events streamed to callers

pub mod catalog;
pub mod credential;
pub mod encoding;
pub mod error;
pub mod event;
pub mod image;
pub mod job;
pub mod progress;

// Re-export common types
pub use catalog::CatalogEntry;
pub use credential::Credential;
pub use encoding::{Canvas, EncodingConfig, PublishDefaults};
pub use error::{ErrorKind, ModelError, ModelResult};
pub use event::{PipelineStage, PublishEvent, PublishEventType};
pub use image::{ImageRef, ImageSet};
pub use job::{JobId, RenderJob, RenderState, UploadJob, UploadState};
pub use progress::{MonotonicPercent, PercentCallback};
