//! Publish pipeline orchestration.
//!
//! [`PublishPipeline`] sequences render, upload and catalog refresh for one
//! request at a time and streams [`vpub_models::PublishEvent`]s to the caller.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod stages;
pub mod state;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use orchestrator::{PublishHandle, PublishOutcome, PublishPipeline, PublishRequest};
pub use progress::CompositeProgress;
pub use stages::{CatalogStage, RenderStage, UploadStage};
pub use state::PipelineState;
