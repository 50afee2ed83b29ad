//! Shared test helpers for CLI integration tests.

use std::fs::File;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use assert_cmd::cargo::{cargo_bin, cargo_bin_cmd};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Stand-in for `docker`.
///
/// Appends its arguments to `$FAKE_DOCKER_LOG`. `info` exits with
/// `$FAKE_DOCKER_INFO_EXIT` (default 0). `run` locates the `<dir>:/var/task`
/// mount and fails for units whose name starts with `broken`. With
/// `$FAKE_DOCKER_HANG` set it sleeps instead of installing. Otherwise it drops
/// a package and a bytecode cache into the mounted directory.
const FAKE_DOCKER: &str = r#"#!/bin/sh
echo "$*" >> "$FAKE_DOCKER_LOG"
if [ "$1" = "info" ]; then
  exit "${FAKE_DOCKER_INFO_EXIT:-0}"
fi
dir=""
for arg in "$@"; do
  case "$arg" in
    *:/var/task) dir="${arg%:/var/task}" ;;
  esac
done
case "$(basename "$dir")" in
  broken*)
    echo "ERROR: No matching distribution found" >&2
    exit 1
    ;;
esac
if [ -n "$FAKE_DOCKER_HANG" ]; then
  exec sleep 30
fi
mkdir -p "$dir/site_pkg/__pycache__"
echo "VERSION = 1" > "$dir/site_pkg/__init__.py"
echo "" > "$dir/site_pkg/__pycache__/__init__.cpython-312.pyc"
exit 0
"#;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the source root,
/// output directory, scratch parent and a fake container runtime. The binary
/// runs with that directory as its working directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let env = Self { temp };

    let runtime = env.runtime_path();
    std::fs::write(&runtime, FAKE_DOCKER).unwrap();
    std::fs::set_permissions(&runtime, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::create_dir_all(env.source_root()).unwrap();
    env
  }

  fn root(&self) -> PathBuf {
    let p = self.temp.path().to_path_buf();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn source_root(&self) -> PathBuf {
    self.root().join("lambdas")
  }

  pub fn output_path(&self) -> PathBuf {
    self.root().join("dist")
  }

  pub fn scratch_path(&self) -> PathBuf {
    self.root().join("scratch")
  }

  pub fn runtime_path(&self) -> PathBuf {
    self.root().join("fake-docker")
  }

  pub fn runtime_log(&self) -> PathBuf {
    self.root().join("docker.log")
  }

  /// Lines the fake runtime logged, empty when it never ran.
  pub fn runtime_calls(&self) -> Vec<String> {
    std::fs::read_to_string(self.runtime_log())
      .map(|s| s.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// A unit under the source root with a manifest and a handler.
  pub fn add_unit(&self, name: &str) {
    self.write_file(&format!("lambdas/{name}/requirements.txt"), "pydantic\n");
    self.write_file(&format!("lambdas/{name}/lambda_function.py"), "def lambda_handler(event, context):\n  return event\n");
  }

  /// Names of the artifacts in the output directory, sorted.
  pub fn artifacts(&self) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(self.output_path())
      .map(|rd| {
        rd.filter_map(Result::ok)
          .map(|e| e.file_name().to_string_lossy().into_owned())
          .collect()
      })
      .unwrap_or_default();
    names.sort();
    names
  }

  /// Whatever the binary left under the scratch parent.
  pub fn scratch_leftovers(&self) -> Vec<PathBuf> {
    std::fs::read_dir(self.scratch_path())
      .map(|rd| rd.filter_map(Result::ok).map(|e| e.path()).collect())
      .unwrap_or_default()
  }

  fn env_vars(&self) -> [(&'static str, PathBuf); 5] {
    [
      ("LAMBDAPACK_SOURCE_ROOT", self.source_root()),
      ("LAMBDAPACK_OUTPUT_DIR", self.output_path()),
      ("LAMBDAPACK_SCRATCH_DIR", self.scratch_path()),
      ("LAMBDAPACK_CONTAINER_RUNTIME", self.runtime_path()),
      ("FAKE_DOCKER_LOG", self.runtime_log()),
    ]
  }

  /// Get a pre-configured Command for the lambdapack binary.
  ///
  /// Runs in the temp directory with every path and the container runtime
  /// pointed into it through `LAMBDAPACK_*` variables.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("lambdapack");
    cmd.current_dir(self.root());
    for var in CLEARED_VARS {
      cmd.env_remove(var);
    }
    cmd.envs(self.env_vars());
    cmd
  }

  /// A plain process command with the same environment as [`TestEnv::cmd`]
  /// and all stdio detached, for tests that signal the running binary.
  pub fn process_cmd(&self) -> std::process::Command {
    let mut cmd = std::process::Command::new(cargo_bin!("lambdapack"));
    cmd.current_dir(self.root());
    for var in CLEARED_VARS {
      cmd.env_remove(var);
    }
    cmd
      .envs(self.env_vars())
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null());
    cmd
  }
}

const CLEARED_VARS: [&str; 3] = ["LAMBDAPACK_IMAGE", "LAMBDAPACK_PYTHON", "RUST_LOG"];

/// Poll `condition` every 10ms until it holds, panicking after `timeout`.
pub fn wait_for(what: &str, timeout: Duration, mut condition: impl FnMut() -> bool) {
  let deadline = Instant::now() + timeout;
  while !condition() {
    assert!(Instant::now() < deadline, "timed out waiting for {what}");
    std::thread::sleep(Duration::from_millis(10));
  }
}

/// Send SIGINT to `child` and wait for it to exit.
pub fn interrupt(child: &mut Child) -> ExitStatus {
  let sent = std::process::Command::new("kill")
    .arg("-INT")
    .arg(child.id().to_string())
    .status()
    .unwrap();
  assert!(sent.success());

  let deadline = Instant::now() + Duration::from_secs(60);
  loop {
    if let Some(status) = child.try_wait().unwrap() {
      return status;
    }
    if Instant::now() >= deadline {
      child.kill().ok();
      panic!("process did not exit after SIGINT");
    }
    std::thread::sleep(Duration::from_millis(10));
  }
}

/// Write a zip at `path` holding empty files with the given names.
pub fn write_zip(path: &Path, names: &[&str]) {
  let mut zip = ZipWriter::new(File::create(path).unwrap());
  for name in names {
    zip.start_file(*name, SimpleFileOptions::default()).unwrap();
    zip.write_all(b"").unwrap();
  }
  zip.finish().unwrap();
}
