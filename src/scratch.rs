//! Scratch directory for the most recently fetched snapshot.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::Result;

/// File name of the snapshot inside the scratch directory.
const SNAPSHOT_FILE: &str = "process_conf.list";

/// Scoped scratch directory, removed when dropped.
///
/// Creating it first removes whatever an interrupted earlier run left behind.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create (or recreate) the scratch directory.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            log::debug!("Removing stale scratch directory {:?}", path);
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    /// Get the path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.path.join(SNAPSHOT_FILE)
    }

    /// Replace the snapshot file with a freshly fetched body.
    pub fn store(&self, snapshot: &[u8]) -> Result<()> {
        fs::write(self.snapshot_path(), snapshot)?;
        Ok(())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove scratch directory {:?}: {}", self.path, e),
        }
    }
}
