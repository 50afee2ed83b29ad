//! Implementation of the `lambdapack inspect` command.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use lambdapack_lib::inspect::{Checklist, InspectReport, inspect};
use lambdapack_lib::platform::Arch;

use super::GlobalArgs;
use crate::output::{OutputFormat, print_failure, print_info, print_json, print_success};

/// Run the checklist against `archive` and print one line per check.
///
/// Failed checks are diagnostic: the exit code only reflects them with
/// `--strict`. An archive that cannot be opened is always an error.
pub fn cmd_inspect(
  globals: &GlobalArgs,
  archive: &Path,
  arch: Option<Arch>,
  format: OutputFormat,
  strict: bool,
) -> Result<ExitCode> {
  let config = globals.load_config()?;
  let mut checklist = Checklist::from(&config.inspect);
  if let Some(arch) = arch {
    checklist.arch = arch;
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(inspect(archive, &checklist))
    .with_context(|| format!("Failed to inspect {}", archive.display()))?;

  if format.is_json() {
    print_json(&report)?;
  } else {
    print_report(&report);
  }

  Ok(if strict && !report.all_passed() {
    ExitCode::FAILURE
  } else {
    ExitCode::SUCCESS
  })
}

fn print_report(report: &InspectReport) {
  print_info(&format!(
    "Inspecting {} ({} entries)",
    report.archive.display(),
    report.entries
  ));
  println!();

  for check in &report.checks {
    let line = match &check.detail {
      Some(detail) => format!(
        "{} {}",
        check.label,
        format!("({})", detail).if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
      None => check.label.clone(),
    };
    if check.passed {
      print_success(&line);
    } else {
      print_failure(&line);
    }
  }

  println!();
  println!("{}/{} checks passed", report.passed(), report.checks.len());
}
