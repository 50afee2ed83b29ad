//! lambdapack-lib: packaging and inspection of Python Lambda deployables
//!
//! This crate provides the pieces the `lambdapack` CLI strings together:
//! - `unit`: discovery of buildable source directories
//! - `select`: the numbered build menu and its input parsing
//! - `scratch`: scoped per-build scratch directories
//! - `install`: containerized dependency installation and prerequisite checks
//! - `archive`: zip packing with exclusions, and extraction
//! - `build`: per-unit, batch and single-target build orchestration
//! - `inspect`: diagnostics for a built artifact
//! - `config`: `lambdapack.json` and `LAMBDAPACK_*` settings

pub mod archive;
pub mod build;
pub mod config;
pub mod consts;
pub mod inspect;
pub mod install;
pub mod platform;
pub mod scratch;
pub mod select;
pub mod unit;
pub mod util;
