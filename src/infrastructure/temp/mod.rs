use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where per-request temp assets are created.
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

impl TempStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve a fresh, uniquely named path. Nothing is created on disk; the
    /// returned guard deletes whatever ends up there.
    pub fn allocate(&self, prefix: &str, extension: &str) -> TempFile {
        let extension = extension.trim_start_matches('.');
        let name = if extension.is_empty() {
            format!("{}-{}", prefix, Uuid::new_v4().simple())
        } else {
            format!("{}-{}.{}", prefix, Uuid::new_v4().simple(), extension)
        };
        TempFile {
            path: self.dir.join(name),
        }
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

/// Scoped ownership of a temp file path.
///
/// The file is deleted exactly once: either by an explicit [`TempFile::release`]
/// or when the guard is dropped (early return, error, or a cancelled request
/// future). Guards held together drop in reverse order of acquisition.
/// Deletion failures are logged and never surface to the caller.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete now instead of at end of scope.
    pub fn release(self) {
        // Drop does the work
    }

    fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Temp file removed");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove temp file"
                );
            }
        }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        self.remove();
    }
}
