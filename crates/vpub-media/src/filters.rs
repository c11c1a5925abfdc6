//! FFmpeg filter graphs for still-image slideshows.

use vpub_models::encoding::PAD_COLOR;
use vpub_models::Canvas;

/// Label of the final video stream produced by [`slideshow_filter`].
pub const OUTPUT_LABEL: &str = "outv";

/// Fit one still onto the canvas: scale down keeping aspect ratio, center on
/// a padded background, square pixels, constant frame rate and pixel format.
pub fn normalize_still(canvas: &Canvas, pixel_format: &str) -> String {
    let (w, h) = (canvas.width, canvas.height);
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color={PAD_COLOR},\
         setsar=1,fps={fps},format={pixel_format}",
        fps = canvas.fps,
    )
}

/// Normalize `count` inputs and concatenate them in input order into
/// `[outv]`.
pub fn slideshow_filter(count: usize, canvas: &Canvas, pixel_format: &str) -> String {
    let normalize = normalize_still(canvas, pixel_format);
    let mut graph = String::new();

    for i in 0..count {
        graph.push_str(&format!("[{i}:v]{normalize}[v{i}];"));
    }
    for i in 0..count {
        graph.push_str(&format!("[v{i}]"));
    }
    graph.push_str(&format!("concat=n={count}:v=1:a=0[{OUTPUT_LABEL}]"));

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_still() {
        let filter = normalize_still(&Canvas::vertical(), "yuv420p");
        assert!(filter.starts_with("scale=1080:1920:force_original_aspect_ratio=decrease,"));
        assert!(filter.contains("pad=1080:1920:(ow-iw)/2:(oh-ih)/2"));
        assert!(filter.contains("setsar=1"));
        assert!(filter.contains("fps=30"));
        assert!(filter.ends_with("format=yuv420p"));
    }

    #[test]
    fn test_slideshow_filter_keeps_order() {
        let graph = slideshow_filter(3, &Canvas::vertical(), "yuv420p");
        assert!(graph.starts_with("[0:v]scale="));
        assert!(graph.contains("[1:v]scale="));
        assert!(graph.contains("[2:v]scale="));
        assert!(graph.ends_with("[v0][v1][v2]concat=n=3:v=1:a=0[outv]"));
    }

    #[test]
    fn test_single_image_still_concats() {
        let graph = slideshow_filter(1, &Canvas::vertical(), "yuv420p");
        assert!(graph.ends_with("[v0]concat=n=1:v=1:a=0[outv]"));
    }
}
