//! Read-only diagnostics for a built Lambda artifact.
//!
//! [`inspect`] extracts the archive into a temporary directory and runs a
//! fixed checklist against it. Individual check failures are recorded in the
//! report and never stop the remaining checks; only an unreadable archive is
//! an error.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use walkdir::WalkDir;

use crate::archive::{ArchiveError, unpack_archive};
use crate::config::InspectConfig;
use crate::platform::Arch;

#[derive(Debug, Error)]
pub enum InspectError {
  #[error("archive not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to create extraction directory: {0}")]
  TempDir(#[source] std::io::Error),

  #[error("failed to extract '{path}': {source}")]
  Extract {
    path: PathBuf,
    #[source]
    source: ArchiveError,
  },
}

/// What a package is expected to contain.
#[derive(Debug, Clone)]
pub struct Checklist {
  pub handler: String,
  pub dependency_dirs: Vec<String>,
  pub arch: Arch,
  pub imports: Vec<String>,
  pub python: String,
}

impl From<&InspectConfig> for Checklist {
  fn from(config: &InspectConfig) -> Self {
    Self {
      handler: config.handler.clone(),
      dependency_dirs: config.dependency_dirs.clone(),
      arch: config.arch,
      imports: config.imports.clone(),
      python: config.python.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
  pub label: String,
  pub passed: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
}

impl Check {
  fn pass(label: impl Into<String>, detail: Option<String>) -> Self {
    Self {
      label: label.into(),
      passed: true,
      detail,
    }
  }

  fn fail(label: impl Into<String>, detail: Option<String>) -> Self {
    Self {
      label: label.into(),
      passed: false,
      detail,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
  pub archive: PathBuf,
  pub entries: usize,
  pub checks: Vec<Check>,
}

impl InspectReport {
  pub fn passed(&self) -> usize {
    self.checks.iter().filter(|c| c.passed).count()
  }

  pub fn all_passed(&self) -> bool {
    self.checks.iter().all(|c| c.passed)
  }
}

/// Extract `archive` and run every check in `checklist`.
pub async fn inspect(archive: &Path, checklist: &Checklist) -> Result<InspectReport, InspectError> {
  if !archive.is_file() {
    return Err(InspectError::NotFound(archive.to_path_buf()));
  }

  let extracted = TempDir::new().map_err(InspectError::TempDir)?;
  let entries = unpack_archive(archive, extracted.path()).map_err(|source| InspectError::Extract {
    path: archive.to_path_buf(),
    source,
  })?;
  debug!(archive = %archive.display(), dir = %extracted.path().display(), entries, "extracted archive");

  let root = extracted.path();
  let extensions = binary_extensions(root);

  let mut checks = Vec::new();
  checks.push(check_handler(root, &checklist.handler));
  checks.extend(checklist.dependency_dirs.iter().map(|d| check_dependency_dir(root, d)));
  checks.push(check_binary_extensions(&extensions));
  checks.push(check_arch(&extensions, checklist.arch));
  for module in &checklist.imports {
    checks.push(check_import(root, module, &checklist.python).await);
  }

  Ok(InspectReport {
    archive: archive.to_path_buf(),
    entries,
    checks,
  })
}

fn check_handler(root: &Path, handler: &str) -> Check {
  let label = format!("handler {handler} present");
  if root.join(handler).is_file() {
    Check::pass(label, None)
  } else {
    Check::fail(label, Some("not found at archive root".to_string()))
  }
}

fn check_dependency_dir(root: &Path, name: &str) -> Check {
  let label = format!("dependency {name}/ present");
  if root.join(name).is_dir() {
    Check::pass(label, None)
  } else {
    Check::fail(label, None)
  }
}

/// Relative paths of every `*.so` file under `root`.
fn binary_extensions(root: &Path) -> Vec<String> {
  let mut found: Vec<String> = WalkDir::new(root)
    .into_iter()
    .filter_map(Result::ok)
    .filter(|e| e.file_type().is_file())
    .filter(|e| e.path().extension().is_some_and(|ext| ext == "so"))
    .filter_map(|e| {
      e.path()
        .strip_prefix(root)
        .ok()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
    })
    .collect();
  found.sort();
  found
}

fn check_binary_extensions(extensions: &[String]) -> Check {
  let label = "binary extensions (*.so) present";
  if extensions.is_empty() {
    Check::fail(label, Some("no compiled extension modules found".to_string()))
  } else {
    Check::pass(label, Some(format!("{} file(s)", extensions.len())))
  }
}

fn check_arch(extensions: &[String], arch: Arch) -> Check {
  let label = format!("{arch} binaries present");
  let matching = extensions.iter().filter(|p| arch.tags_file(file_name(p))).count();
  let foreign: Vec<String> = extensions
    .iter()
    .filter(|p| arch.other().tags_file(file_name(p)))
    .cloned()
    .collect();

  if !foreign.is_empty() {
    return Check::fail(
      label,
      Some(format!("{} {} file(s), e.g. {}", foreign.len(), arch.other(), foreign[0])),
    );
  }
  if matching == 0 {
    return Check::fail(label, Some(format!("no {arch}-tagged files")));
  }
  Check::pass(label, Some(format!("{matching} file(s)")))
}

fn file_name(path: &str) -> &str {
  path.rsplit('/').next().unwrap_or(path)
}

async fn check_import(root: &Path, module: &str, python: &str) -> Check {
  let label = format!("import {module}");

  let mut pythonpath = OsString::from(root.as_os_str());
  if let Some(existing) = std::env::var_os("PYTHONPATH") {
    pythonpath.push(if cfg!(windows) { ";" } else { ":" });
    pythonpath.push(existing);
  }

  let output = Command::new(python)
    .arg("-c")
    .arg(format!("import {module}"))
    .current_dir(root)
    .env("PYTHONPATH", pythonpath)
    .env("PYTHONDONTWRITEBYTECODE", "1")
    .stdin(Stdio::null())
    .kill_on_drop(true)
    .output()
    .await;

  match output {
    Ok(out) if out.status.success() => Check::pass(label, None),
    Ok(out) => {
      let stderr = String::from_utf8_lossy(&out.stderr);
      let last = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("import failed");
      Check::fail(label, Some(last.trim().to_string()))
    }
    Err(e) => Check::fail(label, Some(format!("could not run {python}: {e}"))),
  }
}
