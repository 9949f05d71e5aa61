//! # ReDACT Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file is the entry point of the `redact` CLI, the Reactive Docker App
//! Configuration Toolkit. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system from the verbosity and quiet flags
//! - Snapshotting the environment into the `Session` shared by the commands
//! - Routing execution to the command handlers
//!
//! ## Architecture
//!
//! Each top-level command (`render`, `exec`, `entrypoint`, `show`, `version`)
//! is a variant of `Commands` and maps to a handler in `commands::*`. Handlers
//! return errors instead of exiting; this file prefixes them with the command
//! path (`redact render: ...`) and exits with status 1.
//!
//! ## Examples
//!
//! ```bash
//! # Render a template to stdout
//! redact render /etc/app/app.conf.tmpl
//!
//! # Container entrypoint: render, then drop privileges and exec
//! redact entrypoint -- app:app /usr/bin/app
//!
//! # More logging
//! redact -vv render -o /etc/app.conf /etc/app.conf.tmpl
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Command handlers (render, exec, entrypoint, show, version)
mod common; // Filesystem, pre-render process and privilege helpers
mod core; // Errors, configuration, env store, templating and rendering

use crate::commands::Session;
use crate::core::config::DEFAULT_ENV_PREFIX;
use crate::core::env::EnvStore;

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "redact",
    about = "ReDACT - Reactive Docker App Configuration Toolkit",
    long_about = "ReDACT - Reactive Docker App Configuration Toolkit.\n\
                  Renders configuration files from templates and environment variables,\n\
                  then optionally executes a command as another user.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all logging.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Prefix of the reserved configuration variables.
    #[arg(long, value_name = "PREFIX", default_value = DEFAULT_ENV_PREFIX, global = true)]
    env_prefix: String,
}

#[derive(Parser, Debug)]
enum Commands {
    Render(commands::render::RenderArgs),
    Exec(commands::exec::ExecArgs),
    Entrypoint(commands::entrypoint::EntrypointArgs),
    Show(commands::show::ShowArgs),
    Version(commands::version::VersionArgs),
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Render(_) => "redact render",
            Commands::Exec(_) => "redact exec",
            Commands::Entrypoint(_) => "redact entrypoint",
            Commands::Show(_) => "redact show",
            Commands::Version(_) => "redact version",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "off"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let env_filter = if cli.quiet {
        EnvFilter::new(log_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
    };
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_path = cli.command.path();
    let mut session = Session::new(EnvStore::from_process_env(), cli.env_prefix);

    let command_result = match cli.command {
        Commands::Render(args) => commands::render::handle_render(args, &mut session).await,
        Commands::Exec(args) => commands::exec::handle_exec(args, &mut session).await,
        Commands::Entrypoint(args) => {
            commands::entrypoint::handle_entrypoint(args, &mut session).await
        }
        Commands::Show(args) => commands::show::handle_show(args, &mut session).await,
        Commands::Version(args) => commands::version::handle_version(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("{}: {:#}", command_path, e);
        std::process::exit(1);
    }

    Ok(())
}
