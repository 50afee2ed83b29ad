//! Path exclusion rules applied while packing an artifact.

use std::path::{Component, Path};

/// Name-based exclusions. A path is excluded when any directory along it
/// matches a directory rule, or when it is a file whose name matches a file rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
  /// Exact directory names, e.g. `__pycache__`.
  pub dir_names: Vec<String>,
  /// Directory name suffixes, e.g. `.dist-info`.
  pub dir_suffixes: Vec<String>,
  /// File name suffixes, e.g. `.pyc`.
  pub file_suffixes: Vec<String>,
}

impl ExclusionRules {
  /// Nothing excluded.
  pub fn none() -> Self {
    Self::default()
  }

  /// Bytecode, caches, packaging metadata, VCS metadata, markdown docs and test directories.
  pub fn lambda_default() -> Self {
    let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
    Self {
      dir_names: owned(&["__pycache__", ".git", "tests", "test"]),
      dir_suffixes: owned(&[".dist-info", ".egg-info"]),
      file_suffixes: owned(&[".pyc", ".md"]),
    }
  }

  pub fn excludes_dir_name(&self, name: &str) -> bool {
    self.dir_names.iter().any(|d| d == name) || self.dir_suffixes.iter().any(|s| name.ends_with(s.as_str()))
  }

  pub fn excludes_file_name(&self, name: &str) -> bool {
    self.file_suffixes.iter().any(|s| name.ends_with(s.as_str()))
  }

  /// Whether `relative` (relative to the archive root) is excluded.
  pub fn excludes(&self, relative: &Path, is_dir: bool) -> bool {
    let names: Vec<&str> = relative
      .components()
      .filter_map(|c| match c {
        Component::Normal(name) => name.to_str(),
        _ => None,
      })
      .collect();

    let Some((last, parents)) = names.split_last() else {
      return false;
    };

    if parents.iter().any(|p| self.excludes_dir_name(p)) {
      return true;
    }

    if is_dir {
      self.excludes_dir_name(last)
    } else {
      self.excludes_file_name(last)
    }
  }
}
