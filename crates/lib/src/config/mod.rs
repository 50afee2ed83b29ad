//! Configuration loading.
//!
//! Settings come from three layers, later ones winning:
//! 1. built-in defaults
//! 2. an optional `lambdapack.json` file
//! 3. `LAMBDAPACK_*` environment variables
//!
//! The CLI applies its own flags on top of the returned [`Config`].
//!
//! # File Format
//!
//! ```json
//! {
//!   "source_root": "lambdas",
//!   "output_dir": "dist",
//!   "arm64": { "source_dir": "lambda" },
//!   "inspect": { "arch": "aarch64", "imports": ["lambda_function", "mcp"] }
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  CONFIG_FILENAME, DEFAULT_ARM64_IMAGE, DEFAULT_ARM64_OUTPUT_PREFIX, DEFAULT_ARM64_SOURCE_DIR, DEFAULT_HANDLER,
  DEFAULT_IMAGE, DEFAULT_MANIFEST, DEFAULT_OUTPUT_DIR, DEFAULT_PYTHON, DEFAULT_RUNTIME, DEFAULT_SOURCE_ROOT,
};
use crate::platform::Arch;

pub const ENV_SOURCE_ROOT: &str = "LAMBDAPACK_SOURCE_ROOT";
pub const ENV_OUTPUT_DIR: &str = "LAMBDAPACK_OUTPUT_DIR";
pub const ENV_RUNTIME: &str = "LAMBDAPACK_CONTAINER_RUNTIME";
pub const ENV_IMAGE: &str = "LAMBDAPACK_IMAGE";
pub const ENV_SCRATCH_DIR: &str = "LAMBDAPACK_SCRATCH_DIR";
pub const ENV_PYTHON: &str = "LAMBDAPACK_PYTHON";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read config file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Directory whose subdirectories are candidate units.
  pub source_root: PathBuf,
  /// Where built artifacts are written.
  pub output_dir: PathBuf,
  /// Dependency manifest file name.
  pub manifest: String,
  /// Container CLI used for dependency installs.
  pub container_runtime: String,
  /// Base image for the interactive builder.
  pub image: String,
  /// Parent for scratch directories; system temp when unset.
  pub scratch_dir: Option<PathBuf>,
  pub arm64: Arm64Config,
  pub inspect: InspectConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Arm64Config {
  pub source_dir: PathBuf,
  pub output_prefix: String,
  pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InspectConfig {
  pub handler: String,
  pub dependency_dirs: Vec<String>,
  pub imports: Vec<String>,
  pub arch: Arch,
  pub python: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      source_root: PathBuf::from(DEFAULT_SOURCE_ROOT),
      output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
      manifest: DEFAULT_MANIFEST.to_string(),
      container_runtime: DEFAULT_RUNTIME.to_string(),
      image: DEFAULT_IMAGE.to_string(),
      scratch_dir: None,
      arm64: Arm64Config::default(),
      inspect: InspectConfig::default(),
    }
  }
}

impl Default for Arm64Config {
  fn default() -> Self {
    Self {
      source_dir: PathBuf::from(DEFAULT_ARM64_SOURCE_DIR),
      output_prefix: DEFAULT_ARM64_OUTPUT_PREFIX.to_string(),
      image: DEFAULT_ARM64_IMAGE.to_string(),
    }
  }
}

impl Default for InspectConfig {
  fn default() -> Self {
    Self {
      handler: DEFAULT_HANDLER.to_string(),
      dependency_dirs: ["mcp", "pydantic", "pydantic_core", "httpx", "anyio", "aws_cloudwatch_mcp_adapter"]
        .into_iter()
        .map(String::from)
        .collect(),
      imports: ["lambda_function", "mcp", "pydantic_core"]
        .into_iter()
        .map(String::from)
        .collect(),
      arch: Arch::Aarch64,
      python: DEFAULT_PYTHON.to_string(),
    }
  }
}

impl Config {
  /// Load configuration from `path`, or from `lambdapack.json` in the working
  /// directory when `path` is `None`, then apply environment overrides.
  ///
  /// A missing default file yields defaults. A missing explicit file is an error.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let mut config = match path {
      Some(path) => Self::from_file(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
      None => Self::from_file(Path::new(CONFIG_FILENAME))?.unwrap_or_default(),
    };
    config.apply_env();
    Ok(config)
  }

  /// Returns `Ok(None)` if the file doesn't exist.
  pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source: e,
        });
      }
    };

    let config = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: e,
    })?;
    debug!(path = %path.display(), "loaded config file");
    Ok(Some(config))
  }

  /// Overlay `LAMBDAPACK_*` environment variables. Empty values are ignored.
  pub fn apply_env(&mut self) {
    if let Some(v) = env_value(ENV_SOURCE_ROOT) {
      self.source_root = PathBuf::from(v);
    }
    if let Some(v) = env_value(ENV_OUTPUT_DIR) {
      self.output_dir = PathBuf::from(v);
    }
    if let Some(v) = env_value(ENV_RUNTIME) {
      self.container_runtime = v;
    }
    if let Some(v) = env_value(ENV_IMAGE) {
      self.image = v;
    }
    if let Some(v) = env_value(ENV_SCRATCH_DIR) {
      self.scratch_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = env_value(ENV_PYTHON) {
      self.inspect.python = v;
    }
  }
}

fn env_value(key: &str) -> Option<String> {
  std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
