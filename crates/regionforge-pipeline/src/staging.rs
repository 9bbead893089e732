//! Scoped staging directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

/// The directory holding expanded templates for one run.
///
/// Acquiring it deletes whatever a previous, interrupted run left behind.
/// The directory is removed again by [`StagingArea::close`] or, if the run
/// fails first, when the guard is dropped.
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
    armed: bool,
}

impl StagingArea {
    /// Purge and recreate the staging directory at `path`.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let staging_err = |source| PipelineError::Staging {
            path: path.clone(),
            source,
        };

        if path.exists() {
            debug!(path = %path.display(), "purging stale staging directory");
            fs::remove_dir_all(&path).map_err(staging_err)?;
        }
        fs::create_dir_all(&path).map_err(staging_err)?;

        Ok(StagingArea { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `name` inside the staging directory.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let target = self.path.join(name);
        fs::write(&target, contents).map_err(|source| PipelineError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }

    /// Copy `source_path` verbatim into the staging directory as `name`.
    pub fn copy_in(&self, source_path: &Path, name: &str) -> Result<PathBuf> {
        let target = self.path.join(name);
        fs::copy(source_path, &target).map_err(|source| PipelineError::Read {
            path: source_path.to_path_buf(),
            source,
        })?;
        Ok(target)
    }

    /// Regular files in the staging directory, sorted by file name.
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        let staging_err = |source| PipelineError::Staging {
            path: self.path.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(staging_err)? {
            let entry = entry.map_err(staging_err)?;
            if entry.file_type().map_err(staging_err)?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Remove the staging directory, reporting any failure.
    pub fn close(mut self) -> Result<()> {
        self.armed = false;
        fs::remove_dir_all(&self.path).map_err(|source| PipelineError::Staging {
            path: self.path.clone(),
            source,
        })
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                warn!(path = %self.path.display(), error = %e, "could not remove staging directory");
            }
        }
    }
}
