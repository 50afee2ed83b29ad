//! Scoped scratch directories for isolated builds.
//!
//! A [`ScratchRoot`] owns one uniquely named temporary directory. Each unit
//! gets its own subdirectory so builds never see each other's files. The whole
//! tree is removed when the root is dropped, whichever way the caller exits.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::APP_NAME;

#[derive(Debug, Error)]
pub enum ScratchError {
  #[error("failed to create scratch directory under '{parent}': {source}")]
  Create {
    parent: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to prepare scratch directory '{path}': {source}")]
  Prepare {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to remove scratch directory '{path}': {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

pub struct ScratchRoot {
  dir: Option<TempDir>,
  path: PathBuf,
}

impl ScratchRoot {
  /// Create a scratch root under `parent`, or the system temp dir when `None`.
  pub fn create(parent: Option<&Path>) -> Result<Self, ScratchError> {
    let parent = parent.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    fs::create_dir_all(&parent).map_err(|source| ScratchError::Create {
      parent: parent.clone(),
      source,
    })?;

    let dir = tempfile::Builder::new()
      .prefix(&format!("{APP_NAME}-"))
      .tempdir_in(&parent)
      .map_err(|source| ScratchError::Create {
        parent: parent.clone(),
        source,
      })?;

    // Container bind mounts want the resolved path (macOS /var is a symlink).
    let path = dunce::canonicalize(dir.path()).unwrap_or_else(|_| dir.path().to_path_buf());
    debug!(path = %path.display(), "created scratch root");
    Ok(Self { dir: Some(dir), path })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Fresh, empty subdirectory for one unit. Leftovers from an earlier build
  /// of the same name in this root are wiped.
  pub fn unit_dir(&self, name: &str) -> Result<PathBuf, ScratchError> {
    let path = self.path.join(name);
    let prepare_err = |source| ScratchError::Prepare {
      path: path.clone(),
      source,
    };

    if path.exists() {
      fs::remove_dir_all(&path).map_err(prepare_err)?;
    }
    fs::create_dir_all(&path).map_err(prepare_err)?;
    Ok(path)
  }

  /// Remove the scratch tree now and report failures, instead of the silent
  /// best-effort removal on drop.
  pub fn close(mut self) -> Result<(), ScratchError> {
    match self.dir.take() {
      Some(dir) => dir.close().map_err(|source| ScratchError::Remove {
        path: self.path.clone(),
        source,
      }),
      None => Ok(()),
    }
  }
}

impl Drop for ScratchRoot {
  fn drop(&mut self) {
    if let Some(dir) = self.dir.take() {
      debug!(path = %self.path.display(), "removing scratch root");
      if let Err(e) = dir.close() {
        warn!(path = %self.path.display(), error = %e, "failed to remove scratch root");
      }
    }
  }
}
