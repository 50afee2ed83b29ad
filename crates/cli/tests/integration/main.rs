//! CLI integration tests. They drive the real binary against a shell-script
//! stand-in for the container runtime, so they only run on unix.

#![cfg(unix)]

mod arm64_tests;
mod common;
mod interrupt_tests;
