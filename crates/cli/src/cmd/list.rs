//! Implementation of the `lambdapack list` command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use lambdapack_lib::select::render_menu;
use lambdapack_lib::unit::{Unit, discover_units};

use super::GlobalArgs;
use crate::output::{OutputFormat, print_info, print_json};

#[derive(Serialize)]
struct UnitList<'a> {
  source_root: &'a PathBuf,
  units: &'a [Unit],
}

/// Print the build menu without prompting. Finding no units is not an error
/// here.
pub fn cmd_list(globals: &GlobalArgs, format: OutputFormat) -> Result<ExitCode> {
  let config = globals.load_config()?;
  let units = discover_units(&config.source_root, &config.manifest)
    .with_context(|| format!("Failed to discover Lambdas in {}", config.source_root.display()))?;

  if format.is_json() {
    print_json(&UnitList {
      source_root: &config.source_root,
      units: &units,
    })?;
    return Ok(ExitCode::SUCCESS);
  }

  if units.is_empty() {
    print_info(&format!("No Lambdas found in {}", config.source_root.display()));
    return Ok(ExitCode::SUCCESS);
  }

  for line in render_menu(&units) {
    println!("{}", line);
  }
  Ok(ExitCode::SUCCESS)
}
