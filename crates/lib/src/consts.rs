pub const APP_NAME: &str = "lambdapack";

/// Config file looked up in the working directory when `--config` is not given.
pub const CONFIG_FILENAME: &str = "lambdapack.json";

/// Dependency manifest that turns a directory into a buildable unit.
pub const DEFAULT_MANIFEST: &str = "requirements.txt";

pub const DEFAULT_SOURCE_ROOT: &str = "lambdas";
pub const DEFAULT_OUTPUT_DIR: &str = "dist";
pub const DEFAULT_RUNTIME: &str = "docker";
pub const DEFAULT_IMAGE: &str = "public.ecr.aws/lambda/python:3.12";
pub const DEFAULT_ARM64_IMAGE: &str = "public.ecr.aws/lambda/python:3.12-arm64";
pub const DEFAULT_ARM64_SOURCE_DIR: &str = "lambda";
pub const DEFAULT_ARM64_OUTPUT_PREFIX: &str = "lambda_arm64";
pub const DEFAULT_HANDLER: &str = "lambda_function.py";
pub const DEFAULT_PYTHON: &str = "python3";

/// Mount point of the scratch directory inside the build container.
pub const CONTAINER_TASK_DIR: &str = "/var/task";

/// Scratch subdirectory used by the single-target ARM64 build.
pub const ARM64_SCRATCH_NAME: &str = "arm64-build";

/// Directory names that are never treated as units.
pub const CACHE_DIR_NAMES: &[&str] = &["__pycache__", ".pytest_cache", ".mypy_cache", ".ruff_cache"];

/// Timestamp suffix format for ARM64 artifacts.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
