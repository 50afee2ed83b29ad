mod arm64;
mod build;
mod inspect;
mod list;

pub use arm64::cmd_build_arm64;
pub use build::cmd_build;
pub use inspect::cmd_inspect;
pub use list::cmd_list;

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use lambdapack_lib::config::Config;
use lambdapack_lib::scratch::ScratchRoot;

/// Conventional exit status for a process stopped by SIGINT.
pub const EXIT_INTERRUPTED: u8 = 130;

/// Flags accepted by every subcommand.
pub struct GlobalArgs {
  pub config: Option<PathBuf>,
  pub source_root: Option<PathBuf>,
  pub output_dir: Option<PathBuf>,
}

impl GlobalArgs {
  /// Config file, then environment, then these flags.
  pub fn load_config(&self) -> Result<Config> {
    let mut config = Config::load(self.config.as_deref()).context("Failed to load configuration")?;
    if let Some(root) = &self.source_root {
      config.source_root = root.clone();
    }
    if let Some(dir) = &self.output_dir {
      config.output_dir = dir.clone();
    }
    Ok(config)
  }
}

/// How `build` picks its units.
pub enum Preselect {
  Prompt,
  All,
  Unit(String),
}

/// Result of racing a build against Ctrl-C.
pub enum Interruptible<T> {
  Finished(T),
  Interrupted,
}

/// Ctrl-C listener.
///
/// Installing it replaces the default SIGINT action immediately, so a Ctrl-C
/// that lands before the build is first polled is queued instead of killing
/// the process with the scratch root still on disk. Install it before
/// creating the scratch root.
pub struct Interrupt {
  #[cfg(unix)]
  signal: tokio::signal::unix::Signal,
  #[cfg(windows)]
  signal: tokio::signal::windows::CtrlC,
}

impl Interrupt {
  pub fn install(rt: &Runtime) -> Result<Self> {
    let _guard = rt.enter();
    #[cfg(unix)]
    let signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt());
    #[cfg(windows)]
    let signal = tokio::signal::windows::ctrl_c();
    Ok(Self {
      signal: signal.context("Failed to install Ctrl-C handler")?,
    })
  }

  async fn recv(&mut self) {
    self.signal.recv().await;
  }

  /// Drive `work` to completion unless Ctrl-C arrives first, in which case
  /// the future is dropped. Child processes spawned with `kill_on_drop` die
  /// with it. A pending Ctrl-C wins over work that is also ready.
  pub async fn guard<F: Future>(&mut self, work: F) -> Interruptible<F::Output> {
    tokio::select! {
      biased;
      _ = self.recv() => Interruptible::Interrupted,
      output = work => Interruptible::Finished(output),
    }
  }
}

/// Tear down after an interrupted build and report exit code 130.
///
/// The runtime goes first: dropping it waits for copy and pack tasks still on
/// the blocking pool, so nothing writes into the scratch root once it is
/// removed.
pub fn interrupted_exit(rt: Runtime, scratch: ScratchRoot) -> ExitCode {
  drop(rt);
  match scratch.close() {
    Ok(()) => crate::output::print_warning("Interrupted, scratch directory removed"),
    Err(e) => crate::output::print_warning(&format!("Interrupted, failed to remove scratch directory: {}", e)),
  }
  ExitCode::from(EXIT_INTERRUPTED)
}
