//! On-disk change detection for the watched SWW file.
//!
//! A simulation appends to (or rewrites) its output while the viewer is
//! running. [`FileWatcher`] polls the file's metadata and reports a change
//! exactly once per transition. Modification times can be coarser than the
//! polling interval, so the byte length is compared as well.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Tracks existence, modification time and size of a single file.
#[derive(Debug, Clone, Default)]
pub struct FileWatcher {
    path: PathBuf,
    exists: bool,
    modified: Option<SystemTime>,
    len: u64,
}

impl FileWatcher {
    /// Create a watcher and record the current state of `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let mut watcher = Self::default();
        watcher.watch(path);
        watcher
    }

    /// Choose which file to watch.
    ///
    /// Returns `false` if the file cannot be stat'ed; the path is still
    /// remembered so that its later appearance is reported as a change.
    pub fn watch(&mut self, path: impl AsRef<Path>) -> bool {
        self.path = path.as_ref().to_path_buf();

        match fs::metadata(&self.path) {
            Ok(meta) => {
                self.exists = true;
                self.modified = meta.modified().ok();
                self.len = meta.len();
                true
            },
            Err(e) => {
                tracing::debug!("Cannot watch {}: {}", self.path.display(), e);
                self.exists = false;
                self.modified = None;
                self.len = 0;
                false
            },
        }
    }

    /// Has the file changed since the last observation?
    ///
    /// Triggers once per detected change, then returns `false` until the file
    /// changes again.
    pub fn is_changed(&mut self) -> bool {
        let meta = match fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(_) => {
                if self.exists {
                    tracing::info!("{} was removed", self.path.display());
                    self.exists = false;
                    return true;
                }
                return false;
            },
        };

        let modified = meta.modified().ok();
        let len = meta.len();

        if !self.exists {
            tracing::info!("{} appeared", self.path.display());
            self.exists = true;
            self.modified = modified;
            self.len = len;
            return true;
        }

        if modified != self.modified || len != self.len {
            tracing::debug!(
                "{} changed ({} -> {} bytes)",
                self.path.display(),
                self.len,
                len
            );
            self.modified = modified;
            self.len = len;
            return true;
        }

        false
    }

    /// Path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file existed at the last observation.
    pub fn exists(&self) -> bool {
        self.exists
    }
}
