//! Types for unit builds.
//!
//! Error, result and option types shared by the batch builder and the
//! single-target builder.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::archive::{ArchiveError, ExclusionRules, PackStats};
use crate::install::InstallError;
use crate::scratch::ScratchError;

/// Errors that fail a single unit build.
///
/// In batch mode these are recorded per unit and the batch continues.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The unit's source directory vanished after discovery.
  #[error("source directory does not exist: {0}")]
  SourceMissing(PathBuf),

  /// The unit's manifest vanished after discovery.
  #[error("dependency manifest not found: {0}")]
  ManifestMissing(PathBuf),

  #[error(transparent)]
  Scratch(#[from] ScratchError),

  /// Copying source files into the scratch directory failed.
  #[error("failed to copy '{path}' into scratch directory: {source}")]
  Copy {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to walk source directory: {0}")]
  Walk(#[from] walkdir::Error),

  #[error(transparent)]
  Install(#[from] InstallError),

  #[error("failed to package artifact: {0}")]
  Archive(#[from] ArchiveError),

  /// A copy or pack task on the blocking pool panicked or was cancelled.
  #[error("build task did not complete: {0}")]
  Task(#[from] tokio::task::JoinError),
}

/// Settings shared by every unit in a run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
  pub manifest: String,
  pub output_dir: PathBuf,
  pub exclusions: ExclusionRules,
}

/// A successfully written artifact.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
  pub unit: String,
  pub path: PathBuf,
  pub stats: PackStats,
}

/// Outcome of one unit in a batch.
#[derive(Debug)]
pub struct UnitOutcome {
  pub name: String,
  pub result: Result<Artifact, BuildError>,
  pub duration: Duration,
}

impl UnitOutcome {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }
}

/// Success count over total, displayed as `"<succeeded>/<total>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
  pub succeeded: usize,
  pub total: usize,
}

impl BatchSummary {
  pub fn from_outcomes(outcomes: &[UnitOutcome]) -> Self {
    Self {
      succeeded: outcomes.iter().filter(|o| o.is_success()).count(),
      total: outcomes.len(),
    }
  }

  pub fn failed(&self) -> usize {
    self.total - self.succeeded
  }

  pub fn is_success(&self) -> bool {
    self.succeeded == self.total
  }
}

impl fmt::Display for BatchSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.succeeded, self.total)
  }
}
