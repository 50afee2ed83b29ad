//! Terminal output for the CLI.
//!
//! Status lines are `<symbol> <message>`, colored only when the stream is a
//! terminal. Results go to stdout; errors and warnings go to stderr.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{AnsiColors, OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
}

/// Artifact sizes: bytes below 1 KB, otherwise one decimal in the largest
/// fitting unit.
pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];

  if bytes < 1024 {
    return format!("{bytes} B");
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit + 1 < UNITS.len() {
    value /= 1024.0;
    unit += 1;
  }
  format!("{value:.1} {}", UNITS[unit])
}

/// Per-unit build time.
pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  if secs == 0 {
    format!("{}ms", duration.subsec_millis())
  } else if secs < 60 {
    format!("{:.1}s", duration.as_secs_f64())
  } else {
    format!("{}m {:02}s", secs / 60, secs % 60)
  }
}

fn line_out(symbol: &str, color: AnsiColors, message: &str) {
  println!("{} {}", symbol.if_supports_color(Stream::Stdout, |s| s.color(color)), message);
}

fn line_err(symbol: &str, color: AnsiColors, message: &str) {
  eprintln!(
    "{} {}",
    symbol.if_supports_color(Stream::Stderr, |s| s.color(color)),
    message.if_supports_color(Stream::Stderr, |s| s.color(color))
  );
}

pub fn print_success(message: &str) {
  line_out(symbols::SUCCESS, AnsiColors::Green, message);
}

/// A failed item in a list of results. Goes to stdout alongside the
/// successes, unlike [`print_error`].
pub fn print_failure(message: &str) {
  line_out(symbols::ERROR, AnsiColors::Red, message);
}

pub fn print_info(message: &str) {
  line_out(symbols::INFO, AnsiColors::Blue, message);
}

pub fn print_error(message: &str) {
  line_err(symbols::ERROR, AnsiColors::Red, message);
}

pub fn print_warning(message: &str) {
  line_err(symbols::WARNING, AnsiColors::Yellow, message);
}

pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}
