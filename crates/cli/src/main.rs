mod cmd;
mod output;
mod prompts;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lambdapack_lib::platform::Arch;
use tracing_subscriber::EnvFilter;

use output::OutputFormat;

/// lambdapack - package Python Lambda functions into deployable zips
#[derive(Parser)]
#[command(name = "lambdapack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to a lambdapack.json config file
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Directory containing one subdirectory per Lambda
  #[arg(long, global = true)]
  source_root: Option<PathBuf>,

  /// Directory artifacts are written to
  #[arg(long, global = true)]
  output_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Pick Lambdas from a menu and build them
  Build {
    /// Build every discovered Lambda without prompting
    #[arg(long, conflicts_with = "unit")]
    all: bool,

    /// Build one Lambda by directory name without prompting
    #[arg(long)]
    unit: Option<String>,
  },

  /// Build the fixed ARM64 Lambda into a timestamped zip
  #[command(name = "build-arm64")]
  BuildArm64,

  /// Check a built zip for the handler, dependencies and binaries
  Inspect {
    /// Path to the zip artifact
    archive: PathBuf,

    /// Architecture the binaries must target (x86_64, aarch64, amd64, arm64)
    #[arg(long)]
    arch: Option<Arch>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Exit non-zero when any check fails
    #[arg(long)]
    strict: bool,
  },

  /// List the Lambdas that would appear in the build menu
  List {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("lambdapack=debug,lambdapack_lib=debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let globals = cmd::GlobalArgs {
    config: cli.config,
    source_root: cli.source_root,
    output_dir: cli.output_dir,
  };

  match cli.command {
    Commands::Build { all, unit } => {
      let preselect = match (all, unit) {
        (true, _) => cmd::Preselect::All,
        (false, Some(name)) => cmd::Preselect::Unit(name),
        (false, None) => cmd::Preselect::Prompt,
      };
      cmd::cmd_build(&globals, preselect)
    }
    Commands::BuildArm64 => cmd::cmd_build_arm64(&globals),
    Commands::Inspect {
      archive,
      arch,
      output,
      strict,
    } => cmd::cmd_inspect(&globals, &archive, arch, output, strict),
    Commands::List { output } => cmd::cmd_list(&globals, output),
  }
}
