//! Buildable unit discovery.
//!
//! A unit is a direct subdirectory of the source root that carries a
//! dependency manifest. Cache directories and hidden directories never count.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::consts::CACHE_DIR_NAMES;

#[derive(Debug, Error)]
pub enum DiscoverError {
  #[error("source root does not exist: {0}")]
  RootMissing(PathBuf),

  #[error("failed to read source root '{path}': {source}")]
  ReadRoot {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// One independently buildable Lambda source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
  pub name: String,
  pub path: PathBuf,
}

pub fn is_cache_dir(name: &str) -> bool {
  CACHE_DIR_NAMES.contains(&name)
}

/// List the units under `root`, sorted by name.
pub fn discover_units(root: &Path, manifest: &str) -> Result<Vec<Unit>, DiscoverError> {
  if !root.is_dir() {
    return Err(DiscoverError::RootMissing(root.to_path_buf()));
  }

  let read_err = |source| DiscoverError::ReadRoot {
    path: root.to_path_buf(),
    source,
  };

  let mut units = Vec::new();
  for entry in fs::read_dir(root).map_err(read_err)? {
    let entry = entry.map_err(read_err)?;
    let path = entry.path();
    if !path.is_dir() {
      continue;
    }

    let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
      debug!(path = %path.display(), "skipping non-utf8 directory name");
      continue;
    };

    if is_cache_dir(&name) || name.starts_with('.') {
      continue;
    }

    if !path.join(manifest).is_file() {
      debug!(unit = %name, manifest, "no manifest, skipping");
      continue;
    }

    units.push(Unit { name, path });
  }

  units.sort_by(|a, b| a.name.cmp(&b.name));
  debug!(root = %root.display(), count = units.len(), "discovered units");
  Ok(units)
}
