use std::path::{Path, PathBuf};

use tempfile::TempDir;

const PREFIX: &str = ".trackgrab-";

/// Per-job scratch directory for the raw download, the normalized intermediate
/// and the cover image. Removed when dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a fresh directory under `parent`, so concurrent jobs never share names
    pub fn create(parent: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir_in(parent)?;
        log::debug!("working in {}", dir.path().to_string_lossy());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// destination of the downloaded audio, container unknown
    pub fn raw_download(&self) -> PathBuf {
        self.dir.path().join("raw.download")
    }

    /// Removes the directory, reporting failures that a drop would swallow
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
