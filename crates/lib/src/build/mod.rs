//! Unit build orchestration.
//!
//! A build copies a unit's source into its own scratch directory, installs
//! dependencies there through an [`Installer`], then zips the result:
//!
//! - [`build_unit`] writes `<output_dir>/<unit>.zip`, replacing any previous artifact
//! - [`build_batch`] runs units strictly one after another and records failures
//!   without stopping
//! - [`build_single`] writes a timestamped artifact and never overwrites

mod types;

pub use types::{Artifact, BatchSummary, BuildError, BuildOptions, UnitOutcome};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive::pack_directory;
use crate::consts::{ARM64_SCRATCH_NAME, TIMESTAMP_FORMAT};
use crate::install::Installer;
use crate::scratch::ScratchRoot;
use crate::unit::Unit;

/// Where the batch builder writes a unit's artifact.
pub fn artifact_path(output_dir: &Path, unit_name: &str) -> PathBuf {
  output_dir.join(format!("{unit_name}.zip"))
}

/// `<output_dir>/<prefix>_<timestamp>.zip`, with a `-<n>` suffix when that
/// name is already taken.
pub fn timestamped_artifact_path(output_dir: &Path, prefix: &str, now: DateTime<Local>) -> PathBuf {
  let stem = format!("{prefix}_{}", now.format(TIMESTAMP_FORMAT));
  let mut candidate = output_dir.join(format!("{stem}.zip"));
  let mut n = 1;
  while candidate.exists() {
    candidate = output_dir.join(format!("{stem}-{n}.zip"));
    n += 1;
  }
  candidate
}

/// Build one discovered unit into `<output_dir>/<unit>.zip`.
pub async fn build_unit<I: Installer>(
  unit: &Unit,
  scratch: &ScratchRoot,
  installer: &I,
  options: &BuildOptions,
) -> Result<Artifact, BuildError> {
  let dest = artifact_path(&options.output_dir, &unit.name);
  package(&unit.name, &unit.path, &unit.name, &dest, scratch, installer, options).await
}

/// Build every unit in order. A failed unit is logged and recorded; the
/// remaining units still run.
pub async fn build_batch<I: Installer>(
  units: &[&Unit],
  scratch: &ScratchRoot,
  installer: &I,
  options: &BuildOptions,
) -> Vec<UnitOutcome> {
  let mut outcomes = Vec::with_capacity(units.len());

  for (i, unit) in units.iter().enumerate() {
    info!(unit = %unit.name, position = i + 1, total = units.len(), "building unit");
    let start = Instant::now();
    let result = build_unit(unit, scratch, installer, options).await;

    if let Err(e) = &result {
      warn!(unit = %unit.name, error = %e, "unit build failed");
    }

    outcomes.push(UnitOutcome {
      name: unit.name.clone(),
      result,
      duration: start.elapsed(),
    });
  }

  outcomes
}

/// Build the fixed single-target source directory into a timestamped artifact.
pub async fn build_single<I: Installer>(
  source_dir: &Path,
  output_prefix: &str,
  now: DateTime<Local>,
  scratch: &ScratchRoot,
  installer: &I,
  options: &BuildOptions,
) -> Result<Artifact, BuildError> {
  let dest = timestamped_artifact_path(&options.output_dir, output_prefix, now);
  package(output_prefix, source_dir, ARM64_SCRATCH_NAME, &dest, scratch, installer, options).await
}

async fn package<I: Installer>(
  label: &str,
  source: &Path,
  scratch_name: &str,
  dest: &Path,
  scratch: &ScratchRoot,
  installer: &I,
  options: &BuildOptions,
) -> Result<Artifact, BuildError> {
  if !source.is_dir() {
    return Err(BuildError::SourceMissing(source.to_path_buf()));
  }
  let manifest = source.join(&options.manifest);
  if !manifest.is_file() {
    return Err(BuildError::ManifestMissing(manifest));
  }

  let work_dir = scratch.unit_dir(scratch_name)?;
  let copied = {
    let (src, dst) = (source.to_path_buf(), work_dir.clone());
    task::spawn_blocking(move || copy_tree(&src, &dst)).await??
  };
  debug!(unit = label, files = copied, dir = %work_dir.display(), "copied source into scratch");

  installer.install(&work_dir).await?;

  let stats = {
    let (src, dst, rules) = (work_dir.clone(), dest.to_path_buf(), options.exclusions.clone());
    task::spawn_blocking(move || pack_directory(&src, &dst, &rules)).await??
  };
  Ok(Artifact {
    unit: label.to_string(),
    path: dest.to_path_buf(),
    stats,
  })
}

/// Copy the contents of `src` into the existing directory `dest`. Returns the
/// number of files copied.
///
/// Symlinks are followed. A link whose target is missing is skipped with a
/// warning.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize, BuildError> {
  let mut files = 0;
  for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => match dangling_link(&e) {
        Some(path) => {
          warn!(path = %path.display(), "skipping dangling symlink");
          continue;
        }
        None => return Err(e.into()),
      },
    };
    let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
    let target = dest.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).map_err(|source| BuildError::Copy {
        path: entry.path().to_path_buf(),
        source,
      })?;
    } else {
      fs::copy(entry.path(), &target).map_err(|source| BuildError::Copy {
        path: entry.path().to_path_buf(),
        source,
      })?;
      files += 1;
    }
  }
  Ok(files)
}

fn dangling_link(err: &walkdir::Error) -> Option<&Path> {
  let path = err.path()?;
  let is_link = fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink());
  (is_link && !path.exists()).then_some(path)
}
