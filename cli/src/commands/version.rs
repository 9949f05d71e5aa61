//! # ReDACT Version Handler
//!
//! File: cli/src/commands/version.rs
//!
//! `redact version` prints the version with the target OS and architecture.
//!
use crate::core::error::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Print version")]
pub struct VersionArgs {}

pub fn version_line() -> String {
    format!(
        "redact version {} {} {}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

pub async fn handle_version(_args: VersionArgs) -> Result<()> {
    println!("{}", version_line());
    Ok(())
}
