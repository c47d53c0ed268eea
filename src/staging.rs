//! Temporary staging area for uploaded files.
//!
//! Every upload is written to its own file under the staging directory, named
//! with a random UUID so concurrent requests never share a path. The returned
//! [`StagedFile`] owns that path: it is removed either explicitly through
//! [`StagedFile::remove`] or, if the owner returns early, when it is dropped.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StagingError;

/// Default staging directory, relative to the working directory.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Directory that holds in-flight uploads.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the staging directory if it does not exist yet.
    pub async fn prepare(&self) -> Result<(), StagingError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StagingError::Prepare {
                path: self.dir.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Create a fresh, uniquely named file and open it for writing.
    pub async fn create(&self) -> Result<StagingWriter, StagingError> {
        let path = self.dir.join(Uuid::new_v4().simple().to_string());
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| io_error(&path, e))?;

        debug!(path = %path.display(), "Staging upload");

        Ok(StagingWriter {
            staged: StagedFile {
                path,
                released: false,
            },
            file,
            written: 0,
        })
    }
}

/// Write handle for a file being staged.
///
/// Dropping the writer before [`finish`](Self::finish) removes the partial file.
pub struct StagingWriter {
    staged: StagedFile,
    file: File,
    written: u64,
}

impl StagingWriter {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), StagingError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| io_error(&self.staged.path, e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush and close the file, handing back ownership of the staged path.
    pub async fn finish(mut self) -> Result<StagedFile, StagingError> {
        self.file
            .flush()
            .await
            .map_err(|e| io_error(&self.staged.path, e))?;
        debug!(
            path = %self.staged.path.display(),
            bytes = self.written,
            "Upload staged"
        );
        Ok(self.staged)
    }
}

/// An uploaded file on disk, removed when released or dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    released: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the staged file within the staging directory.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Delete the staged file now. A file that is already gone counts as removed.
    pub async fn remove(mut self) -> Result<(), StagingError> {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Blocking unlink on the current thread. This only runs on early exits and
        // must finish before the drop returns so the directory is clean afterwards.
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staged upload on drop"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                "Failed to remove staged upload: {}",
                e
            ),
        }
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StagingError {
    StagingError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
