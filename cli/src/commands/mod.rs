//! # ReDACT Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the subcommands of the `redact` CLI and the
//! `Session` they share. Each subcommand defines its own Clap arguments struct
//! and an async handler that receives those arguments plus the session.
//!
//! ## Command Groups
//!
//! - `render`: render a template to stdout or a file
//! - `exec`: run a command as another user/group
//! - `entrypoint`: render to a file, then `exec`
//! - `show`: debugging outputs (`show env-config`)
//! - `version`: print version and platform
//!
use crate::core::env::EnvStore;

/// Renders configuration then executes a command as another user.
pub mod entrypoint;
/// Executes a command as another user, gosu style.
pub mod exec;
/// Renders configuration from a template file.
pub mod render;
/// Debugging and troubleshooting outputs.
pub mod show;
/// Prints the version.
pub mod version;

/// State shared by all commands of one invocation.
#[derive(Debug, Clone)]
pub struct Session {
    /// Snapshot of the environment, plus pre-render overlays once merged.
    pub env: EnvStore,
    /// Prefix of the reserved variables (`RDCT_` unless overridden).
    pub env_prefix: String,
}

impl Session {
    pub fn new(env: EnvStore, env_prefix: impl Into<String>) -> Self {
        Session {
            env,
            env_prefix: env_prefix.into(),
        }
    }
}
