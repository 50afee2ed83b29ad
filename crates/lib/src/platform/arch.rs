use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CPU architectures a Lambda package can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
  #[serde(alias = "amd64", alias = "x86-64")]
  X86_64,
  #[serde(alias = "arm64")]
  Aarch64,
}

impl Arch {
  /// Returns the lowercase string identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Aarch64 => "aarch64",
    }
  }

  /// Value for `docker run --platform`.
  pub fn container_platform(&self) -> &'static str {
    match self {
      Self::X86_64 => "linux/amd64",
      Self::Aarch64 => "linux/arm64",
    }
  }

  pub fn other(&self) -> Self {
    match self {
      Self::X86_64 => Self::Aarch64,
      Self::Aarch64 => Self::X86_64,
    }
  }

  /// Whether a file name carries this architecture's tag, as in
  /// `_pydantic_core.cpython-312-aarch64-linux-gnu.so`.
  pub fn tags_file(&self, file_name: &str) -> bool {
    file_name.contains(self.as_str())
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Arch {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "x86_64" | "amd64" | "x86-64" => Ok(Self::X86_64),
      "aarch64" | "arm64" => Ok(Self::Aarch64),
      other => Err(format!("unsupported architecture '{other}', expected x86_64 or aarch64")),
    }
  }
}
