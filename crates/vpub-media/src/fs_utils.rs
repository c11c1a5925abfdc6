//! Filesystem helpers for handing finished renders to the caller.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// EXDEV on Linux and macOS.
const CROSS_DEVICE_ERRNO: i32 = 18;

/// Move `src` to `dst`, creating the destination directory when needed.
///
/// Render workspaces usually live on a different filesystem than the output
/// directory, so a failed rename with EXDEV falls back to copying into a
/// sibling `.partial` file and renaming that into place. `dst` is never
/// observed half-written.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(CROSS_DEVICE_ERRNO) => {
            tracing::debug!(
                src = %src.display(),
                dst = %dst.display(),
                "cross-device rename, copying instead"
            );
            copy_into_place(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

async fn copy_into_place(src: &Path, dst: &Path) -> MediaResult<()> {
    let staging = dst.with_extension("partial");

    if let Err(e) = fs::copy(src, &staging).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&staging, dst).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(src = %src.display(), "failed to remove source after copy: {}", e);
    }

    Ok(())
}

/// True if `path` exists and is a regular file.
pub async fn is_regular_file(path: impl AsRef<Path>) -> bool {
    fs::metadata(path.as_ref())
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
