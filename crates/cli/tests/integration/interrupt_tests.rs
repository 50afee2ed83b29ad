//! Ctrl-C handling during builds.

use std::time::Duration;

use serial_test::serial;

use super::common::{TestEnv, interrupt, wait_for};

const EXIT_INTERRUPTED: i32 = 130;

#[test]
#[serial]
fn interrupt_during_copy_removes_scratch() {
  let env = TestEnv::new();
  env.add_unit("orders");
  for i in 0..3000 {
    env.write_file(&format!("lambdas/orders/pkg/mod_{i}.py"), "X = 1\n");
  }

  let mut child = env
    .process_cmd()
    .args(["build", "--all"])
    .env("FAKE_DOCKER_HANG", "1")
    .spawn()
    .unwrap();
  // The scratch root only exists once the Ctrl-C handler is in place.
  wait_for("scratch root", Duration::from_secs(30), || !env.scratch_leftovers().is_empty());
  let status = interrupt(&mut child);

  assert_eq!(status.code(), Some(EXIT_INTERRUPTED));
  assert!(env.scratch_leftovers().is_empty(), "{:?}", env.scratch_leftovers());
  assert!(env.artifacts().is_empty());
}

#[test]
#[serial]
fn interrupt_during_install_stops_batch_and_removes_scratch() {
  let env = TestEnv::new();
  env.add_unit("alpha");
  env.add_unit("beta");

  let mut child = env
    .process_cmd()
    .args(["build", "--all"])
    .env("FAKE_DOCKER_HANG", "1")
    .spawn()
    .unwrap();
  wait_for("runtime call", Duration::from_secs(30), || !env.runtime_calls().is_empty());
  let status = interrupt(&mut child);

  assert_eq!(status.code(), Some(EXIT_INTERRUPTED));
  assert!(env.scratch_leftovers().is_empty(), "{:?}", env.scratch_leftovers());
  assert_eq!(env.runtime_calls().len(), 1);
  assert!(env.artifacts().is_empty());
}

#[test]
#[serial]
fn interrupted_arm64_build_removes_scratch() {
  let env = TestEnv::new();
  env.write_file("lambda/requirements.txt", "pydantic\n");
  env.write_file("lambda/lambda_function.py", "");

  let mut child = env
    .process_cmd()
    .arg("build-arm64")
    .env("FAKE_DOCKER_HANG", "1")
    .spawn()
    .unwrap();
  // `info` first, then the install run.
  wait_for("install run", Duration::from_secs(30), || env.runtime_calls().len() >= 2);
  let status = interrupt(&mut child);

  assert_eq!(status.code(), Some(EXIT_INTERRUPTED));
  assert!(env.scratch_leftovers().is_empty(), "{:?}", env.scratch_leftovers());
  assert!(env.artifacts().is_empty());
}
