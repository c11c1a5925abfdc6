//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Highest percent reported while the encoder is still running. 100 is
/// reserved for the moment the output file is in place.
pub const ENCODING_PERCENT_CAP: u8 = 99;

/// Progress snapshot from FFmpeg's `-progress` key/value stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Set on the final `progress=end` block
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Progress percentage given the expected output duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms.max(0) as f64 / total_duration_ms as f64) * 100.0).min(100.0)
    }

    /// Whole percent for reporting, capped below 100.
    pub fn encoding_percent(&self, total_duration_ms: i64) -> u8 {
        (self.percentage(total_duration_ms).floor() as u8).min(ENCODING_PERCENT_CAP)
    }

    /// Apply one `key=value` line. Returns a snapshot at the end of each block.
    pub fn apply_line(&mut self, line: &str) -> Option<FfmpegProgress> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();

        match key {
            // Both keys carry microseconds; out_time_ms is misnamed upstream.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "out_time" => {
                if let Some(ms) = parse_clock_ms(value) {
                    self.out_time_ms = ms;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    self.fps = fps;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                self.is_complete = value == "end";
                return Some(self.clone());
            }
            _ => {}
        }

        None
    }
}

/// True for lines belonging to the `-progress` stream rather than log output.
pub fn is_progress_line(line: &str) -> bool {
    match line.trim().split_once('=') {
        Some((key, _)) => {
            !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Parse `HH:MM:SS.micro` into milliseconds.
fn parse_clock_ms(value: &str) -> Option<i64> {
    let mut parts = value.splitn(3, ':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if hours < 0 || minutes < 0 || seconds < 0.0 {
        return None;
    }
    Some((hours * 3600 + minutes * 60) * 1000 + (seconds * 1000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 5000,
            ..Default::default()
        };

        assert!((progress.percentage(10000) - 50.0).abs() < 0.01);
        assert!((progress.percentage(5000) - 100.0).abs() < 0.01);
        assert_eq!(progress.percentage(0), 0.0);
    }

    #[test]
    fn test_encoding_percent_never_reaches_hundred() {
        let progress = FfmpegProgress {
            out_time_ms: 60_000,
            ..Default::default()
        };
        assert_eq!(progress.encoding_percent(60_000), 99);
        assert_eq!(progress.encoding_percent(120_000), 50);
    }

    #[test]
    fn test_apply_block() {
        let mut progress = FfmpegProgress::default();

        assert!(progress.apply_line("frame=150").is_none());
        assert!(progress.apply_line("out_time_us=5000000").is_none());
        assert!(progress.apply_line("speed=2.5x").is_none());
        let snapshot = progress.apply_line("progress=continue").unwrap();

        assert_eq!(snapshot.frame, 150);
        assert_eq!(snapshot.out_time_ms, 5000);
        assert!((snapshot.speed - 2.5).abs() < 0.01);
        assert!(!snapshot.is_complete);

        let end = progress.apply_line("progress=end").unwrap();
        assert!(end.is_complete);
    }

    #[test]
    fn test_out_time_clock() {
        let mut progress = FfmpegProgress::default();
        progress.apply_line("out_time=00:01:02.500000");
        assert_eq!(progress.out_time_ms, 62_500);

        progress.apply_line("out_time=N/A");
        assert_eq!(progress.out_time_ms, 62_500);
    }

    #[test]
    fn test_speed_not_available() {
        let mut progress = FfmpegProgress::default();
        progress.apply_line("speed=N/A");
        assert_eq!(progress.speed, 0.0);
    }

    #[test]
    fn test_is_progress_line() {
        assert!(is_progress_line("out_time_us=1000"));
        assert!(is_progress_line("progress=end"));
        assert!(!is_progress_line("[image2 @ 0x55] Could not open file : a.jpg"));
        assert!(!is_progress_line("Error opening input files: No such file or directory"));
    }
}
