//! # ReDACT Exec Handler
//!
//! File: cli/src/commands/exec.rs
//!
//! ## Overview
//!
//! Implements `redact exec USERSPEC COMMAND [ARGS...]`: drop to another user
//! and group, then replace the process with `COMMAND`. See
//! `common::privilege` for how the USERSPEC is resolved.
//!
//! ## Usage
//!
//! ```bash
//! redact exec www-data nginx -g 'daemon off;'
//! redact exec 1000:1000 -- /app/server --port 8080
//! ```
//!
use crate::commands::Session;
use crate::common::privilege;
use crate::core::error::Result;
use clap::Parser;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    about = "Execute command as another user",
    long_about = "Execute a command as another user and group, replacing the redact\n\
                  process. USERSPEC is user[:group]; names or numeric ids."
)]
pub struct ExecArgs {
    /// user[:group] to run the command as.
    #[arg(value_name = "USERSPEC")]
    pub userspec: String,

    /// Command and its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Only returns when the exec failed.
pub async fn handle_exec(args: ExecArgs, _session: &mut Session) -> Result<()> {
    debug!("Exec args: {:?}", args);
    Err(privilege::exec(&args.userspec, &args.command).into())
}
