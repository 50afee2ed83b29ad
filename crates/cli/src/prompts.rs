use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};

/// Print `menu` and a prompt to stderr, then read one line from stdin.
///
/// Piped input is accepted so the menu can be driven by scripts.
pub fn read_selection(menu: &[String]) -> Result<String> {
  let mut stderr = io::stderr();
  for line in menu {
    writeln!(stderr, "{}", line)?;
  }
  write!(stderr, "Select a Lambda to build: ")?;
  stderr.flush()?;

  let mut input = String::new();
  let read = io::stdin()
    .lock()
    .read_line(&mut input)
    .context("Failed to read selection")?;
  if read == 0 {
    bail!("No selection given (stdin closed)");
  }

  Ok(input)
}
