//! Test utilities for lambdapack-lib.
//!
//! Fixture builders for unit directories and a recording [`Installer`] that
//! never touches a container runtime.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::install::{InstallError, Installer};

/// Create `root/name/requirements.txt` with the given content and a handler file.
pub fn write_unit(root: &Path, name: &str, requirements: &str) -> PathBuf {
  let dir = root.join(name);
  fs::create_dir_all(&dir).unwrap();
  fs::write(dir.join("requirements.txt"), requirements).unwrap();
  fs::write(dir.join("lambda_function.py"), "def lambda_handler(event, context):\n    return {}\n").unwrap();
  dir
}

/// Write a file relative to `root`, creating parents.
pub fn write_file(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, content).unwrap();
}

/// Installer double that records every directory it is asked to install into.
///
/// Directories whose name is in `failing` report exit code 1. Successful
/// installs drop a `site_pkg/__init__.py` plus a bytecode cache so archive
/// exclusions can be observed.
#[derive(Default)]
pub struct FakeInstaller {
  pub calls: RefCell<Vec<PathBuf>>,
  pub failing: HashSet<String>,
}

impl FakeInstaller {
  pub fn failing_on(names: &[&str]) -> Self {
    Self {
      calls: RefCell::default(),
      failing: names.iter().map(|n| n.to_string()).collect(),
    }
  }

  pub fn call_names(&self) -> Vec<String> {
    self
      .calls
      .borrow()
      .iter()
      .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
      .collect()
  }
}

impl Installer for FakeInstaller {
  async fn install(&self, dir: &Path) -> Result<(), InstallError> {
    self.calls.borrow_mut().push(dir.to_path_buf());

    let name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    if self.failing.contains(&name) {
      return Err(InstallError::Failed { code: Some(1) });
    }

    write_file(dir, "site_pkg/__init__.py", "");
    write_file(dir, "site_pkg/__pycache__/__init__.cpython-312.pyc", "");
    Ok(())
  }
}
