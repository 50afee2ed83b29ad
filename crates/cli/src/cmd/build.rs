//! Implementation of the `lambdapack build` command.
//!
//! Discovers buildable Lambdas under the source root, lets the user pick one
//! or all of them from a numbered menu, and builds the selection one unit at a
//! time. A failed unit does not stop the rest of the batch.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tracing::debug;

use lambdapack_lib::archive::ExclusionRules;
use lambdapack_lib::build::{BatchSummary, BuildOptions, UnitOutcome, build_batch};
use lambdapack_lib::install::ContainerInstaller;
use lambdapack_lib::scratch::ScratchRoot;
use lambdapack_lib::select::{Selection, parse_selection, render_menu};
use lambdapack_lib::unit::{Unit, discover_units};

use super::{GlobalArgs, Interrupt, Interruptible, Preselect, interrupted_exit};
use crate::output::{format_bytes, format_duration, print_error, print_failure, print_success, print_warning, symbols};
use crate::prompts::read_selection;

/// Execute the build command.
///
/// Exits non-zero when no units were found, the selection is invalid, or any
/// selected unit failed to build. Nothing is handed to the container runtime
/// before a valid selection exists.
pub fn cmd_build(globals: &GlobalArgs, preselect: Preselect) -> Result<ExitCode> {
  let config = globals.load_config()?;

  let units = discover_units(&config.source_root, &config.manifest)
    .with_context(|| format!("Failed to discover Lambdas in {}", config.source_root.display()))?;
  if units.is_empty() {
    print_error(&format!(
      "No Lambdas found in {} (a Lambda is a directory containing {})",
      config.source_root.display(),
      config.manifest
    ));
    return Ok(ExitCode::FAILURE);
  }
  debug!(count = units.len(), "discovered units");

  let selection = match preselect {
    Preselect::All => Selection::All,
    Preselect::Unit(name) => match Selection::by_name(&units, &name) {
      Some(selection) => selection,
      None => bail!("Unknown Lambda '{}'", name),
    },
    Preselect::Prompt => {
      let input = read_selection(&render_menu(&units))?;
      match parse_selection(&input, units.len()) {
        Ok(selection) => selection,
        Err(e) => {
          print_error(&e.to_string());
          return Ok(ExitCode::FAILURE);
        }
      }
    }
  };
  let selected: Vec<&Unit> = selection.resolve(&units);

  let options = BuildOptions {
    manifest: config.manifest.clone(),
    output_dir: config.output_dir.clone(),
    exclusions: ExclusionRules::lambda_default(),
  };
  let installer = ContainerInstaller::new(&config.container_runtime, &config.image, &config.manifest);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let mut interrupt = Interrupt::install(&rt)?;
  let scratch = ScratchRoot::create(config.scratch_dir.as_deref()).context("Failed to create scratch directory")?;
  debug!(path = %scratch.path().display(), "scratch root");

  let batch = build_batch(&selected, &scratch, &installer, &options);
  let outcomes = match rt.block_on(interrupt.guard(batch)) {
    Interruptible::Finished(outcomes) => outcomes,
    Interruptible::Interrupted => return Ok(interrupted_exit(rt, scratch)),
  };
  if let Err(e) = scratch.close() {
    print_warning(&format!("Failed to remove scratch directory: {}", e));
  }

  println!();
  for outcome in &outcomes {
    print_outcome(outcome);
  }

  let summary = BatchSummary::from_outcomes(&outcomes);
  if selection == Selection::All {
    println!();
    println!("{} lambda(s) built successfully", summary);
  }

  Ok(if summary.is_success() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

fn print_outcome(outcome: &UnitOutcome) {
  match &outcome.result {
    Ok(artifact) => print_success(&format!(
      "{} {} {} ({}, {})",
      outcome.name,
      symbols::ARROW,
      artifact.path.display(),
      format_bytes(artifact.stats.archive_bytes),
      format_duration(outcome.duration)
    )),
    Err(e) => print_failure(&format!("{}: {}", outcome.name, e)),
  }
}
