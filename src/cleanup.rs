//! Temp-file bookkeeping for one invocation.

use std::io::ErrorKind;
use std::path::PathBuf;

/// Every temporary file an invocation created. Deleting is best effort:
/// failures are logged and never reported to the caller.
///
/// Files left over when the value is dropped are removed then, so an early
/// `?` return still reclaims disk.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    paths: Vec<PathBuf>,
}

impl TempArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path for deletion. Register right after creating the file.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delete every tracked file. Returns how many were actually removed.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    log::debug!("removed temp file {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => log::warn!("could not remove temp file {}: {e}", path.display()),
            }
        }
        removed
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        if !self.paths.is_empty() {
            self.cleanup();
        }
    }
}
