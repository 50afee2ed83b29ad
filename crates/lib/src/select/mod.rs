//! Menu rendering and selection parsing for the interactive builder.
//!
//! Menu index `0` builds every unit; `1..=n` picks a single unit.

use thiserror::Error;

use crate::unit::Unit;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
  #[error("invalid selection '{0}': expected a number")]
  NotANumber(String),

  #[error("selection {value} is out of range (0-{max})")]
  OutOfRange { value: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
  All,
  /// 1-based menu index.
  One(usize),
}

impl Selection {
  /// The units this selection refers to, in menu order.
  ///
  /// Callers obtain a `Selection` from [`parse_selection`] with the same
  /// unit count, so `One` is always in range.
  pub fn resolve<'a>(&self, units: &'a [Unit]) -> Vec<&'a Unit> {
    match self {
      Selection::All => units.iter().collect(),
      Selection::One(index) => index.checked_sub(1).and_then(|i| units.get(i)).into_iter().collect(),
    }
  }

  /// Look up a unit by name instead of by menu index.
  pub fn by_name(units: &[Unit], name: &str) -> Option<Self> {
    units.iter().position(|u| u.name == name).map(|i| Selection::One(i + 1))
  }
}

/// Menu lines, "build all" first.
pub fn render_menu(units: &[Unit]) -> Vec<String> {
  let mut lines = Vec::with_capacity(units.len() + 1);
  lines.push("0) Build all".to_string());
  lines.extend(units.iter().enumerate().map(|(i, u)| format!("{}) {}", i + 1, u.name)));
  lines
}

/// Parse one line of user input against a menu of `unit_count` units.
///
/// Negative numbers are rejected as non-numeric since menu indices are unsigned.
pub fn parse_selection(input: &str, unit_count: usize) -> Result<Selection, SelectionError> {
  let trimmed = input.trim();
  let value: usize = trimmed
    .parse()
    .map_err(|_| SelectionError::NotANumber(trimmed.to_string()))?;

  match value {
    0 => Ok(Selection::All),
    v if v <= unit_count => Ok(Selection::One(v)),
    v => Err(SelectionError::OutOfRange {
      value: v,
      max: unit_count,
    }),
  }
}
