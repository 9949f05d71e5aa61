//! # ReDACT Show Command Group
//!
//! File: cli/src/commands/show/mod.rs
//!
//! ## Overview
//!
//! Router for `redact show`, the debugging and troubleshooting outputs.
//!
//! ```bash
//! # List the reserved RDCT_* variables redact sees
//! redact show env-config
//! ```
//!
use crate::commands::Session;
use crate::core::error::Result;
use clap::{Parser, Subcommand};

/// Implements `redact show env-config`.
mod env_config;

#[derive(Parser, Debug)]
#[command(about = "Debugging and troubleshooting outputs")]
pub struct ShowArgs {
    #[command(subcommand)]
    command: ShowCommand,
}

#[derive(Subcommand, Debug)]
enum ShowCommand {
    /// Show redact environment config.
    EnvConfig(env_config::EnvConfigArgs),
}

pub async fn handle_show(args: ShowArgs, session: &mut Session) -> Result<()> {
    match args.command {
        ShowCommand::EnvConfig(args) => env_config::handle_env_config(args, session).await?,
    }
    Ok(())
}
