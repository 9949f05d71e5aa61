//! # ReDACT Show Env-Config Handler
//!
//! File: cli/src/commands/show/env_config.rs
//!
//! Prints every variable under the reserved prefix, sorted by key, as two
//! left-aligned columns.
//!
use crate::commands::Session;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::collections::BTreeMap;
use std::io::{self, Write};

#[derive(Parser, Debug)]
#[command(about = "Show redact environment config")]
pub struct EnvConfigArgs {}

pub async fn handle_env_config(_args: EnvConfigArgs, session: &mut Session) -> Result<()> {
    let vars = session.env.to_map_filtered_by_prefix(&session.env_prefix);
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(format_columns(&vars).as_bytes())
        .context("Failed to write env config")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// One `KEY VALUE` line per entry, values aligned one column past the longest key.
fn format_columns(vars: &BTreeMap<String, String>) -> String {
    let width = vars.keys().map(|k| k.len()).max().unwrap_or(0) + 1;
    vars.iter()
        .map(|(key, value)| format!("{:<width$}{}\n", key, value, width = width))
        .collect()
}
