//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output canvas width (portrait)
pub const TARGET_WIDTH: u32 = 1080;
/// Output canvas height (portrait)
pub const TARGET_HEIGHT: u32 = 1920;
/// Output frame rate
pub const TARGET_FPS: u32 = 30;
/// Output pixel format, decodable by every mainstream player
pub const TARGET_PIXEL_FORMAT: &str = "yuv420p";
/// Padding color behind letterboxed images
pub const PAD_COLOR: &str = "black";

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 20;

/// "People & Blogs"
pub const DEFAULT_CATEGORY_ID: &str = "22";
pub const DEFAULT_PRIVACY_STATUS: &str = "public";

/// Fixed output geometry. Every render uses the same canvas regardless of
/// input image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Canvas {
    pub fn vertical() -> Self {
        Self {
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
            fps: TARGET_FPS,
        }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::vertical()
    }
}

/// Video encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Output pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_pixel_format() -> String {
    TARGET_PIXEL_FORMAT.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            pixel_format: TARGET_PIXEL_FORMAT.to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Metadata applied to every published video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PublishDefaults {
    pub category_id: String,
    pub privacy_status: String,
    pub made_for_kids: bool,
}

impl Default for PublishDefaults {
    fn default() -> Self {
        Self {
            category_id: DEFAULT_CATEGORY_ID.to_string(),
            privacy_status: DEFAULT_PRIVACY_STATUS.to_string(),
            made_for_kids: false,
        }
    }
}
