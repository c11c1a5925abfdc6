//! Isolated scratch directories for render jobs.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vpub_models::JobId;

use crate::error::MediaResult;

/// Temporary directory owned by a single render job.
///
/// The encoder writes only inside this directory; dropping the workspace
/// removes it along with any partial output, so concurrent renderers never
/// see each other's files.
pub struct RenderWorkspace {
    dir: TempDir,
}

impl RenderWorkspace {
    /// Create `<root>/render-<job_id>-XXXX`, creating `root` if needed.
    pub fn create(root: &Path, job_id: &JobId) -> MediaResult<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("render-{}-", job_id))
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
