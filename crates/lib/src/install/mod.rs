//! Dependency installation inside a Lambda base image.
//!
//! The [`Installer`] trait is the seam between build orchestration and the
//! container runtime. [`ContainerInstaller`] shells out to `docker` (or any
//! CLI with the same `run` flags) and mounts the scratch directory as the
//! container's task root, so `pip install -t .` lands next to the source.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::consts::CONTAINER_TASK_DIR;
use crate::platform::Arch;

#[derive(Debug, Error)]
pub enum InstallError {
  /// The runtime binary could not be started.
  #[error("failed to start '{runtime}': {source}")]
  Spawn {
    runtime: String,
    #[source]
    source: std::io::Error,
  },

  /// The install command ran and exited non-zero.
  #[error("dependency install failed{}", code_suffix(.code))]
  Failed { code: Option<i32> },
}

/// Missing prerequisites for a build. These abort before any work starts.
#[derive(Debug, Error)]
pub enum PrereqError {
  #[error("container runtime '{0}' is not installed or not on PATH")]
  RuntimeNotFound(String),

  #[error("container runtime '{runtime}' is not running (`{runtime} info` failed{})", code_suffix(.code))]
  RuntimeUnavailable { runtime: String, code: Option<i32> },

  #[error("source directory does not exist: {0}")]
  SourceMissing(PathBuf),

  #[error("dependency manifest not found: {0}")]
  ManifestMissing(PathBuf),
}

fn code_suffix(code: &Option<i32>) -> String {
  code.map(|c| format!(" with code {c}")).unwrap_or_default()
}

/// Installs a unit's dependencies into its scratch directory.
#[allow(async_fn_in_trait)]
pub trait Installer {
  async fn install(&self, dir: &Path) -> Result<(), InstallError>;
}

/// Runs `pip install` inside a container image.
#[derive(Debug, Clone)]
pub struct ContainerInstaller {
  pub runtime: String,
  pub image: String,
  /// Forces `--platform`; the runtime's default platform when `None`.
  pub platform: Option<Arch>,
  pub manifest: String,
}

impl ContainerInstaller {
  pub fn new(runtime: impl Into<String>, image: impl Into<String>, manifest: impl Into<String>) -> Self {
    Self {
      runtime: runtime.into(),
      image: image.into(),
      platform: None,
      manifest: manifest.into(),
    }
  }

  pub fn with_platform(mut self, arch: Arch) -> Self {
    self.platform = Some(arch);
    self
  }

  /// Arguments passed to the runtime for a scratch directory at `dir`.
  ///
  /// On unix the container runs as the owner of `dir`, so installed packages
  /// stay removable along with the rest of the scratch tree.
  pub fn run_args(&self, dir: &Path) -> Vec<String> {
    let mut args = vec!["run".to_string(), "--rm".to_string()];
    if let Some(arch) = self.platform {
      args.push("--platform".to_string());
      args.push(arch.container_platform().to_string());
    }
    if let Some(user) = owner(dir) {
      args.extend(["--user".to_string(), user, "-e".to_string(), "HOME=/tmp".to_string()]);
    }
    args.extend([
      "-v".to_string(),
      format!("{}:{}", dir.display(), CONTAINER_TASK_DIR),
      "-w".to_string(),
      CONTAINER_TASK_DIR.to_string(),
      "--entrypoint".to_string(),
      "pip".to_string(),
      self.image.clone(),
      "install".to_string(),
      "-r".to_string(),
      self.manifest.clone(),
      "-t".to_string(),
      ".".to_string(),
      "--no-cache-dir".to_string(),
    ]);
    args
  }
}

#[cfg(unix)]
fn owner(dir: &Path) -> Option<String> {
  use std::os::unix::fs::MetadataExt;
  let meta = std::fs::metadata(dir).ok()?;
  Some(format!("{}:{}", meta.uid(), meta.gid()))
}

#[cfg(not(unix))]
fn owner(_dir: &Path) -> Option<String> {
  None
}

impl Installer for ContainerInstaller {
  async fn install(&self, dir: &Path) -> Result<(), InstallError> {
    info!(image = %self.image, dir = %dir.display(), "installing dependencies");

    let args = self.run_args(dir);
    debug!(runtime = %self.runtime, args = ?args, "spawning container");

    let status = Command::new(&self.runtime)
      .args(&args)
      .current_dir(dir)
      .stdin(Stdio::null())
      .kill_on_drop(true)
      .status()
      .await
      .map_err(|source| InstallError::Spawn {
        runtime: self.runtime.clone(),
        source,
      })?;

    if !status.success() {
      return Err(InstallError::Failed { code: status.code() });
    }
    Ok(())
  }
}

/// Check that the runtime binary exists and its daemon answers `info`.
pub async fn check_runtime(runtime: &str) -> Result<(), PrereqError> {
  let binary = which::which(runtime).map_err(|_| PrereqError::RuntimeNotFound(runtime.to_string()))?;
  debug!(runtime, path = %binary.display(), "found container runtime");

  let output = Command::new(&binary)
    .arg("info")
    .stdin(Stdio::null())
    .kill_on_drop(true)
    .output()
    .await
    .map_err(|_| PrereqError::RuntimeNotFound(runtime.to_string()))?;

  if !output.status.success() {
    debug!(stderr = %String::from_utf8_lossy(&output.stderr), "runtime info failed");
    return Err(PrereqError::RuntimeUnavailable {
      runtime: runtime.to_string(),
      code: output.status.code(),
    });
  }
  Ok(())
}

/// Check that `source_dir` exists and carries `manifest`.
pub fn check_source(source_dir: &Path, manifest: &str) -> Result<(), PrereqError> {
  if !source_dir.is_dir() {
    return Err(PrereqError::SourceMissing(source_dir.to_path_buf()));
  }
  let manifest_path = source_dir.join(manifest);
  if !manifest_path.is_file() {
    return Err(PrereqError::ManifestMissing(manifest_path));
  }
  Ok(())
}

/// Runtime check followed by source check; the first failure wins.
pub async fn preflight(runtime: &str, source_dir: &Path, manifest: &str) -> Result<(), PrereqError> {
  check_runtime(runtime).await?;
  check_source(source_dir, manifest)
}
