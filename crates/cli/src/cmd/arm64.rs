//! Implementation of the `lambdapack build-arm64` command.
//!
//! Builds the single configured ARM64 Lambda without prompting. Prerequisites
//! are checked up front and any failure aborts the run.

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;

use lambdapack_lib::archive::ExclusionRules;
use lambdapack_lib::build::{BuildOptions, build_single};
use lambdapack_lib::install::{ContainerInstaller, preflight};
use lambdapack_lib::platform::Arch;
use lambdapack_lib::scratch::ScratchRoot;

use super::{GlobalArgs, Interrupt, Interruptible, interrupted_exit};
use crate::output::{format_bytes, print_error, print_info, print_stat, print_success, print_warning};

pub fn cmd_build_arm64(globals: &GlobalArgs) -> Result<ExitCode> {
  let config = globals.load_config()?;
  let source_dir = &config.arm64.source_dir;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  if let Err(e) = rt.block_on(preflight(&config.container_runtime, source_dir, &config.manifest)) {
    print_error(&e.to_string());
    return Ok(ExitCode::FAILURE);
  }

  print_info(&format!(
    "Building {} for {}",
    source_dir.display(),
    Arch::Aarch64.container_platform()
  ));

  let options = BuildOptions {
    manifest: config.manifest.clone(),
    output_dir: config.output_dir.clone(),
    exclusions: ExclusionRules::lambda_default(),
  };
  let installer =
    ContainerInstaller::new(&config.container_runtime, &config.arm64.image, &config.manifest).with_platform(Arch::Aarch64);

  let mut interrupt = Interrupt::install(&rt)?;
  let scratch = ScratchRoot::create(config.scratch_dir.as_deref()).context("Failed to create scratch directory")?;
  let build = build_single(
    source_dir,
    &config.arm64.output_prefix,
    Local::now(),
    &scratch,
    &installer,
    &options,
  );
  let result = match rt.block_on(interrupt.guard(build)) {
    Interruptible::Finished(result) => result,
    Interruptible::Interrupted => return Ok(interrupted_exit(rt, scratch)),
  };
  if let Err(e) = scratch.close() {
    print_warning(&format!("Failed to remove scratch directory: {}", e));
  }

  match result {
    Ok(artifact) => {
      print_success(&format!("Built {}", artifact.path.display()));
      print_stat("Files", &artifact.stats.files.to_string());
      print_stat("Excluded", &artifact.stats.excluded.to_string());
      print_stat("Size", &format_bytes(artifact.stats.archive_bytes));
      Ok(ExitCode::SUCCESS)
    }
    Err(e) => {
      print_error(&format!("ARM64 build failed: {}", e));
      Ok(ExitCode::FAILURE)
    }
  }
}
