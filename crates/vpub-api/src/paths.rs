//! Confinement of client-supplied file paths.
//!
//! WebSocket clients name files by path: staged images for a publish, the
//! rendered video for an upload retry. Both are resolved on disk and must land
//! inside the directory the server itself writes them to.

use std::path::{Path, PathBuf};

use crate::error::{ApiError, ApiResult};

/// Directories a client may reference.
#[derive(Debug, Clone)]
pub struct AllowedDirs {
    /// Where image search stages downloads
    pub images: PathBuf,
    /// Where the renderer writes finished videos
    pub videos: PathBuf,
}

impl AllowedDirs {
    pub fn new(images: impl Into<PathBuf>, videos: impl Into<PathBuf>) -> Self {
        Self {
            images: images.into(),
            videos: videos.into(),
        }
    }

    /// Resolve a staged image path.
    pub fn image(&self, path: &Path) -> ApiResult<PathBuf> {
        confine(path, &self.images)
    }

    /// Resolve a rendered video path. Only `.mp4` files qualify.
    pub fn video(&self, path: &Path) -> ApiResult<PathBuf> {
        let is_mp4 = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));
        if !is_mp4 {
            return Err(ApiError::bad_request(format!(
                "Not a rendered video: {}",
                path.display()
            )));
        }
        confine(path, &self.videos)
    }
}

/// Canonicalize `path` and require a regular file under `base`.
fn confine(path: &Path, base: &Path) -> ApiResult<PathBuf> {
    let not_allowed = || ApiError::bad_request(format!("Path not allowed: {}", path.display()));

    if path.to_string_lossy().contains('\0') {
        return Err(not_allowed());
    }

    let base = base.canonicalize().map_err(|_| not_allowed())?;
    let resolved = path.canonicalize().map_err(|e| {
        ApiError::bad_request(format!("Cannot resolve {}: {}", path.display(), e))
    })?;

    if !resolved.starts_with(&base) || !resolved.is_file() {
        return Err(not_allowed());
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn layout() -> (tempfile::TempDir, AllowedDirs) {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("images");
        let videos = root.path().join("videos");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::create_dir_all(&videos).unwrap();
        std::fs::write(images.join("p1.jpg"), b"jpg").unwrap();
        std::fs::write(videos.join("sunsets.mp4"), b"mp4").unwrap();
        std::fs::write(root.path().join("tokens.json"), b"{}").unwrap();
        std::fs::write(root.path().join("leak.mp4"), b"mp4").unwrap();
        let dirs = AllowedDirs::new(images, videos);
        (root, dirs)
    }

    #[test]
    fn test_accepts_files_inside_their_directory() {
        let (_root, dirs) = layout();

        let image = dirs.image(&dirs.images.join("p1.jpg")).unwrap();
        assert!(image.is_absolute());
        assert!(image.ends_with("images/p1.jpg"));

        let video = dirs.video(&dirs.videos.join("sunsets.mp4")).unwrap();
        assert!(video.ends_with("videos/sunsets.mp4"));
    }

    #[test]
    fn test_rejects_escape_by_dot_dot() {
        let (_root, dirs) = layout();

        let err = dirs
            .video(&dirs.videos.join("..").join("leak.mp4"))
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = dirs.image(&dirs.images.join("..").join("tokens.json")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rejects_files_outside_or_of_the_wrong_kind() {
        let (root, dirs) = layout();

        assert!(dirs.image(&root.path().join("tokens.json")).is_err());
        assert!(dirs.video(&root.path().join("tokens.json")).is_err());
        assert!(dirs.image(&dirs.videos.join("sunsets.mp4")).is_err());
        assert!(dirs.video(&dirs.images.join("p1.jpg")).is_err());
        assert!(dirs.image(&dirs.images).is_err());
        assert!(dirs.image(&dirs.images.join("missing.jpg")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_symlink_out_of_directory() {
        let (root, dirs) = layout();
        let link = dirs.videos.join("escape.mp4");
        std::os::unix::fs::symlink(root.path().join("tokens.json"), &link).unwrap();

        assert!(dirs.video(&link).is_err());
    }
}
