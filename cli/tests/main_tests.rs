//! # ReDACT CLI Main Integration Tests
//!
//! File: cli/tests/main_tests.rs
//!
//! Top-level behaviour of the `redact` binary: help, version and argument errors.
//!

mod common;
use common::redact_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    redact_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reactive Docker App Configuration Toolkit"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("entrypoint"));
}

#[test]
fn test_version_flag() {
    redact_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_subcommand() {
    redact_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "redact version {} {} {}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        )));
}

#[test]
fn test_unknown_subcommand_fails() {
    redact_cmd().arg("bogus").assert().failure();
}

#[test]
fn test_missing_subcommand_fails() {
    redact_cmd().assert().failure();
}
