//! # ReDACT CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each test file
//! declares `mod common;` and builds commands through `redact_cmd()`.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::PathBuf;

/// Reserved variables that would leak settings from the developer's shell.
const RESERVED_KEYS: [&str; 6] = [
    "RDCT_TPL_ENGINE",
    "RDCT_DEFAULT_TPL_ENGINE",
    "RDCT_TPL_PATH",
    "RDCT_DEFAULT_TPL_PATH",
    "RDCT_CFG_PATH",
    "RDCT_DEFAULT_CFG_PATH",
];

/// An `assert_cmd::Command` for the compiled `redact` binary, with the
/// reserved `RDCT_*` variables removed from its environment.
///
/// ## Panics
/// Panics if the `redact` binary cannot be found via `Command::cargo_bin`.
pub fn redact_cmd() -> Command {
    let mut cmd = Command::cargo_bin("redact").expect("Failed to find redact binary for testing");
    for key in RESERVED_KEYS {
        cmd.env_remove(key);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Absolute path of a file under `cli/tests/fixtures/`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
