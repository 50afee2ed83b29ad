//! build-arm64 command integration tests.

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

fn add_arm64_source(env: &TestEnv) {
  env.write_file("lambda/requirements.txt", "pydantic\n");
  env.write_file("lambda/lambda_function.py", "def lambda_handler(event, context):\n  return event\n");
}

#[test]
#[serial]
fn missing_runtime_aborts() {
  let env = TestEnv::new();
  add_arm64_source(&env);

  env
    .cmd()
    .arg("build-arm64")
    .env("LAMBDAPACK_CONTAINER_RUNTIME", "lambdapack-no-such-runtime")
    .assert()
    .failure()
    .stderr(predicate::str::contains("not installed"));

  assert!(env.artifacts().is_empty());
}

#[test]
#[serial]
fn stopped_runtime_aborts_before_install() {
  let env = TestEnv::new();
  add_arm64_source(&env);

  env
    .cmd()
    .arg("build-arm64")
    .env("FAKE_DOCKER_INFO_EXIT", "1")
    .assert()
    .failure()
    .stderr(predicate::str::contains("is not running"));

  assert_eq!(env.runtime_calls(), ["info"]);
}

#[test]
#[serial]
fn missing_manifest_aborts_before_install() {
  let env = TestEnv::new();
  env.write_file("lambda/lambda_function.py", "");

  env
    .cmd()
    .arg("build-arm64")
    .assert()
    .failure()
    .stderr(predicate::str::contains("dependency manifest not found"));

  assert_eq!(env.runtime_calls(), ["info"]);
  assert!(env.artifacts().is_empty());
}

#[test]
#[serial]
fn builds_timestamped_artifact_for_arm64() {
  let env = TestEnv::new();
  add_arm64_source(&env);

  env
    .cmd()
    .arg("build-arm64")
    .assert()
    .success()
    .stdout(predicate::str::contains("Built"));

  let calls = env.runtime_calls();
  assert_eq!(calls.len(), 2, "{calls:?}");
  assert!(calls[1].contains("--platform linux/arm64"));
  assert!(calls[1].contains("public.ecr.aws/lambda/python:3.12-arm64"));
  assert!(calls[1].contains("/arm64-build:/var/task"));

  let artifacts = env.artifacts();
  assert_eq!(artifacts.len(), 1);
  // lambda_arm64_YYYYmmdd_HHMMSS.zip
  let stamp = artifacts[0]
    .strip_prefix("lambda_arm64_")
    .and_then(|s| s.strip_suffix(".zip"))
    .unwrap();
  assert_eq!(stamp.len(), 15, "{stamp}");
  assert!(env.scratch_leftovers().is_empty());
}

#[test]
#[serial]
fn repeated_builds_never_overwrite() {
  let env = TestEnv::new();
  add_arm64_source(&env);

  env.cmd().arg("build-arm64").assert().success();
  env.cmd().arg("build-arm64").assert().success();

  let artifacts = env.artifacts();
  assert_eq!(artifacts.len(), 2, "{artifacts:?}");
  assert_ne!(artifacts[0], artifacts[1]);
}
