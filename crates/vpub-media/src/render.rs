//! Image-set to vertical video rendering.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use vpub_models::{Canvas, EncodingConfig, ImageSet, MonotonicPercent, PercentCallback, RenderJob};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{slideshow_filter, OUTPUT_LABEL};
use crate::fs_utils::{is_regular_file, move_file};
use crate::progress::FfmpegProgress;
use crate::workspace::RenderWorkspace;

/// Seconds between encoder progress blocks.
const STATS_PERIOD_SECS: f64 = 0.5;
/// Longest slug kept in generated file names.
const MAX_SLUG_LEN: usize = 80;
/// File name used for the encoder output inside the workspace.
const STAGED_OUTPUT: &str = "render.mp4";
/// File name stem for titles with no ASCII letters or digits.
const FALLBACK_SLUG: &str = "video";

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Parent directory for per-job workspaces
    pub work_dir: PathBuf,
    /// Where finished videos land when the caller gives no path
    pub output_dir: PathBuf,
    /// Encoder wall-clock limit
    pub timeout_secs: u64,
    pub canvas: Canvas,
    pub encoding: EncodingConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("vpub-render"),
            output_dir: PathBuf::from("output"),
            timeout_secs: 600,
            canvas: Canvas::vertical(),
            encoding: EncodingConfig::default(),
        }
    }
}

impl RendererConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("RENDER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("RENDER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            timeout_secs: std::env::var("RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            ..defaults
        }
    }
}

/// Inputs for one render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub title: String,
    pub images: ImageSet,
    pub total_duration_secs: f64,
    /// Defaults to `<output_dir>/<slug>-<unix_millis>.mp4`
    pub output_path: Option<PathBuf>,
}

impl RenderRequest {
    pub fn new(title: impl Into<String>, images: ImageSet, total_duration_secs: f64) -> Self {
        Self {
            title: title.into(),
            images,
            total_duration_secs,
            output_path: None,
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
}

/// Composes an image set into a single H.264 MP4.
///
/// One render runs at a time per instance. Each render encodes inside its own
/// [`RenderWorkspace`] and the result is moved to the output path only after
/// the encoder exits cleanly.
pub struct Renderer {
    config: RendererConfig,
    lock: Mutex<()>,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Render `request`, reporting whole percents to `on_progress`.
    ///
    /// Progress never decreases, stays at or below 99 while encoding and
    /// reaches 100 exactly once, after the output file is in place. Sending
    /// `true` on `cancel` kills the encoder and discards partial output.
    pub async fn render(
        &self,
        request: RenderRequest,
        on_progress: PercentCallback,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<RenderJob> {
        let title = request.title.trim().to_string();
        let slug = validate_request(&title, request.total_duration_secs)?;

        let _guard = self.lock.lock().await;

        let output_path = request.output_path.unwrap_or_else(|| {
            self.config
                .output_dir
                .join(output_file_name(&slug, Utc::now().timestamp_millis()))
        });
        let mut job = RenderJob::new(
            title,
            request.images,
            request.total_duration_secs,
            output_path.clone(),
        );

        for image in job.images.iter() {
            if !is_regular_file(image.path()).await {
                return Err(MediaError::missing_input(&image.id, image.path()));
            }
        }

        job.start()?;
        info!(
            job_id = %job.id,
            images = job.images.len(),
            per_image_secs = job.per_image_secs,
            output = %output_path.display(),
            "Render started"
        );

        let workspace = RenderWorkspace::create(&self.config.work_dir, &job.id)?;
        let staged = workspace.file(STAGED_OUTPUT);
        let cmd = build_render_command(&job, &staged, &self.config);

        let progress = Arc::new(MonotonicPercent::new(on_progress));
        let reporter = Arc::clone(&progress);
        let total_ms = (job.total_duration_secs * 1000.0).round() as i64;

        let mut runner = FfmpegRunner::new().with_timeout(self.config.timeout_secs);
        if let Some(cancel_rx) = cancel {
            runner = runner.with_cancel(cancel_rx);
        }

        let started = Instant::now();
        let encoded = runner
            .run_with_progress(&cmd, move |p| report_encoding(&reporter, &p, total_ms))
            .await;

        if let Err(e) = encoded {
            warn!(job_id = %job.id, error = %e, "Render failed");
            counter!("vpub_renders_total", "status" => "failed", "kind" => e.kind().as_str())
                .increment(1);
            // Workspace drop removes the partial output.
            return Err(e);
        }

        finalize(&mut job, &staged, &progress).await?;
        drop(workspace);

        let elapsed = started.elapsed().as_secs_f64();
        histogram!("vpub_render_duration_seconds").record(elapsed);
        counter!("vpub_renders_total", "status" => "success", "kind" => "none").increment(1);
        info!(
            job_id = %job.id,
            output = %output_path.display(),
            elapsed_secs = elapsed,
            "Render completed"
        );

        Ok(job)
    }
}

/// Forward one encoder progress block. Stays below 100 while encoding.
fn report_encoding(progress: &MonotonicPercent, snapshot: &FfmpegProgress, total_ms: i64) {
    progress.report(snapshot.encoding_percent(total_ms));
}

/// Move the staged file to the job's output path, then emit the single 100.
async fn finalize(
    job: &mut RenderJob,
    staged: &Path,
    progress: &MonotonicPercent,
) -> MediaResult<()> {
    move_file(staged, &job.output_path).await?;
    job.set_progress(progress.current());
    job.complete()?;
    progress.report(100);
    Ok(())
}

fn validate_request(title: &str, total_duration_secs: f64) -> MediaResult<String> {
    if !total_duration_secs.is_finite() || total_duration_secs <= 0.0 {
        return Err(MediaError::validation(format!(
            "total duration must be a positive number of seconds, got {}",
            total_duration_secs
        )));
    }
    if title.is_empty() {
        return Err(MediaError::validation("title must not be empty"));
    }
    let slug = slugify(title);
    if slug.is_empty() {
        return Ok(FALLBACK_SLUG.to_string());
    }
    Ok(slug)
}

fn build_render_command(
    job: &RenderJob,
    staged: &Path,
    config: &RendererConfig,
) -> FfmpegCommand {
    let canvas = &config.canvas;
    let encoding = &config.encoding;

    let cmd = job
        .images
        .iter()
        .fold(FfmpegCommand::new(staged), |cmd, image| {
            cmd.still_image(image.path(), job.per_image_secs, canvas.fps)
        });

    cmd.filter_complex(slideshow_filter(
        job.images.len(),
        canvas,
        &encoding.pixel_format,
    ))
    .map(format!("[{}]", OUTPUT_LABEL))
    .video_codec(encoding.codec.as_str())
    .preset(encoding.preset.as_str())
    .crf(encoding.crf)
    .pixel_format(encoding.pixel_format.as_str())
    .frame_rate(canvas.fps)
    .no_audio()
    .faststart()
    .output_args(encoding.extra_args.iter().cloned())
    .stats_period(STATS_PERIOD_SECS)
}

/// Lowercase ASCII slug with single dashes between words.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
            if slug.len() >= MAX_SLUG_LEN {
                break;
            }
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// `<slug>-<unix_millis>.mp4`
pub fn output_file_name(slug: &str, unix_millis: i64) -> String {
    format!("{}-{}.mp4", slug, unix_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use vpub_models::{ErrorKind, ImageRef, RenderState};

    fn recorder() -> (PercentCallback, Arc<StdMutex<Vec<u8>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (Arc::new(move |p| sink.lock().unwrap().push(p)), seen)
    }

    fn renderer_in(dir: &Path) -> Renderer {
        Renderer::new(RendererConfig {
            work_dir: dir.join("work"),
            output_dir: dir.join("out"),
            timeout_secs: 120,
            ..Default::default()
        })
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Top 5 Sunsets!"), "top-5-sunsets");
        assert_eq!(slugify("  --Hello,   World--  "), "hello-world");
        assert_eq!(slugify("日本"), "");
        assert_eq!(slugify(&"a".repeat(200)).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("sunsets", 1700000000123), "sunsets-1700000000123.mp4");
    }

    #[test]
    fn test_render_command_uses_per_image_duration() {
        let images = ImageSet::new(vec![
            ImageRef::new("a", "/img/a.jpg"),
            ImageRef::new("b", "/img/b.jpg"),
            ImageRef::new("c", "/img/c.jpg"),
        ])
        .unwrap();
        let job = RenderJob::new("Sunsets", images, 60.0, "/out/sunsets.mp4");
        let args = build_render_command(&job, Path::new("/ws/render.mp4"), &RendererConfig::default())
            .build_args();

        assert_eq!(args.iter().filter(|a| *a == "20.000").count(), 3);
        assert!(args.windows(2).any(|w| w == ["-map", "[outv]"]));
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuv420p"]));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
        assert_eq!(args.last().map(String::as_str), Some("/ws/render.mp4"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_duration_and_title() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer_in(dir.path());
        let images = ImageSet::new(vec![ImageRef::new("a", dir.path().join("a.jpg"))]).unwrap();

        for duration in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let (cb, _) = recorder();
            let err = renderer
                .render(RenderRequest::new("Title", images.clone(), duration), cb, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "duration {duration}");
        }

        for title in ["", "   "] {
            let (cb, _) = recorder();
            let err = renderer
                .render(RenderRequest::new(title, images.clone(), 10.0), cb, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "title {title:?}");
        }
    }

    #[tokio::test]
    async fn test_missing_image_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer_in(dir.path());
        let present = dir.path().join("a.jpg");
        std::fs::write(&present, b"jpg").unwrap();
        let missing = dir.path().join("gone.jpg");

        let images = ImageSet::new(vec![
            ImageRef::new("a", &present),
            ImageRef::new("gone", &missing),
        ])
        .unwrap();
        let output = dir.path().join("out").join("video.mp4");
        let (cb, seen) = recorder();

        let err = renderer
            .render(
                RenderRequest::new("Title", images, 10.0).with_output_path(&output),
                cb,
                None,
            )
            .await
            .unwrap_err();

        match &err {
            MediaError::MissingInput { image_id, path } => {
                assert_eq!(image_id, "gone");
                assert_eq!(path, &missing);
            }
            other => panic!("Expected MissingInput, got {:?}", other),
        }
        assert!(!output.exists());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_ascii_title_uses_fallback_slug() {
        assert_eq!(validate_request("日本の夕日", 10.0).unwrap(), FALLBACK_SLUG);
        assert_eq!(validate_request("Top 5 日本", 10.0).unwrap(), "top-5");
    }

    #[tokio::test]
    async fn test_non_ascii_title_passes_validation() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer_in(dir.path());
        let images = ImageSet::new(vec![ImageRef::new("a", dir.path().join("a.jpg"))]).unwrap();
        let (cb, _) = recorder();

        let err = renderer
            .render(RenderRequest::new("日本の夕日", images, 10.0), cb, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingInput);
    }

    fn feed(progress: &MonotonicPercent, stream: &str, total_ms: i64) {
        let mut parser = FfmpegProgress::default();
        for line in stream.lines() {
            if let Some(snapshot) = parser.apply_line(line) {
                report_encoding(progress, &snapshot, total_ms);
            }
        }
    }

    fn staged_job(dir: &Path) -> (RenderJob, RenderWorkspace, PathBuf) {
        let images = ImageSet::new(vec![ImageRef::new("a", dir.join("a.jpg"))]).unwrap();
        let mut job = RenderJob::new("Sunsets", images, 3.0, dir.join("out").join("sunsets.mp4"));
        job.start().unwrap();
        let workspace = RenderWorkspace::create(&dir.join("work"), &job.id).unwrap();
        let staged = workspace.file(STAGED_OUTPUT);
        (job, workspace, staged)
    }

    #[tokio::test]
    async fn test_progress_reaches_100_only_after_output_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let (cb, seen) = recorder();
        let progress = MonotonicPercent::new(cb);
        let (mut job, _workspace, staged) = staged_job(dir.path());

        feed(
            &progress,
            "out_time_us=0\nprogress=continue\n\
             out_time_us=1500000\nprogress=continue\n\
             out_time_us=1400000\nprogress=continue\n\
             out_time_us=3000000\nprogress=end\n",
            3000,
        );
        assert_eq!(*seen.lock().unwrap(), vec![0, 50, 99]);

        std::fs::write(&staged, b"mp4").unwrap();
        finalize(&mut job, &staged, &progress).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 50, 99, 100]);
        assert_eq!(job.state, RenderState::Rendered);
        assert_eq!(job.percent_complete, 100);
        assert!(job.output_path.exists());
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_failed_finalize_never_reports_100() {
        let dir = tempfile::tempdir().unwrap();
        let (cb, seen) = recorder();
        let progress = MonotonicPercent::new(cb);
        let (mut job, _workspace, staged) = staged_job(dir.path());

        feed(&progress, "out_time_us=2400000\nprogress=end\n", 3000);
        assert!(finalize(&mut job, &staged, &progress).await.is_err());

        assert_eq!(*seen.lock().unwrap(), vec![80]);
        assert_eq!(job.state, RenderState::Rendering);
        assert!(!job.output_path.exists());
    }

    async fn make_test_image(path: &Path, size: &str) {
        let cmd = FfmpegCommand::new(path)
            .input_with_args(["-f", "lavfi"], format!("color=c=red:s={}", size))
            .output_args(["-frames:v", "1"]);
        FfmpegRunner::new().run(&cmd).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_render_three_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut refs = Vec::new();
        for (i, size) in ["640x480", "480x640", "1000x1000"].iter().enumerate() {
            let path = dir.path().join(format!("img{i}.png"));
            make_test_image(&path, size).await;
            refs.push(ImageRef::new(format!("img{i}"), path));
        }

        let renderer = renderer_in(dir.path());
        let (cb, seen) = recorder();
        let job = renderer
            .render(
                RenderRequest::new("Three Colors", ImageSet::new(refs).unwrap(), 3.0),
                cb,
                None,
            )
            .await
            .unwrap();

        assert_eq!(job.state, RenderState::Rendered);
        assert!((job.per_image_secs - 1.0).abs() < 1e-9);
        assert!(job.output_path.exists());
        assert!(job.output_path.starts_with(dir.path().join("out")));

        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.iter().filter(|p| **p == 100).count(), 1);
        assert_eq!(seen.last(), Some(&100));

        let leftovers = std::fs::read_dir(dir.path().join("work")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_cancel_discards_output() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("img.png");
        make_test_image(&image, "640x480").await;

        let renderer = renderer_in(dir.path());
        let output = dir.path().join("out").join("cancelled.mp4");
        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();

        let (cb, seen) = recorder();
        let err = renderer
            .render(
                RenderRequest::new("Long", ImageSet::new(vec![ImageRef::new("img", &image)]).unwrap(), 600.0)
                    .with_output_path(&output),
                cb,
                Some(cancel_rx),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Cancelled));
        assert!(!output.exists());
        assert!(!seen.lock().unwrap().contains(&100));
    }
}
