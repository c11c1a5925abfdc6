//! FFmpeg CLI wrapper for rendering image sets into vertical videos.
//!
//! This crate provides:
//! - Multi-input FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeouts via tokio
//! - Still-image normalization and concatenation filters
//! - Isolated per-job render workspaces
//! - The [`Renderer`] that ties them together

pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod progress;
pub mod render;
pub mod workspace;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
pub use render::{RenderRequest, Renderer, RendererConfig};
pub use workspace::RenderWorkspace;
