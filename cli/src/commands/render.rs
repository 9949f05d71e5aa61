//! # ReDACT Render Handler
//!
//! File: cli/src/commands/render.rs
//!
//! ## Overview
//!
//! Implements `redact render [TEMPLATE_PATH]`: optionally run a pre-render
//! script, resolve engine/template/config from the environment and flags, then
//! render to stdout (no config path) or to a file.
//!
//! `RenderOptions` and `apply_pre_render` are shared with `redact entrypoint`.
//!
//! ## Usage
//!
//! ```bash
//! # Render to stdout with the native engine
//! redact render /etc/app/app.conf.tmpl
//!
//! # Render to a file with the mustache engine
//! redact render -e mustache -o /etc/app/app.conf /etc/app/app.conf.mustache
//!
//! # Everything from the environment
//! RDCT_TPL_PATH=/tpl/app.tmpl RDCT_CFG_PATH=/etc/app.conf redact render
//! ```
//!
use crate::commands::Session;
use crate::common::process::PreRenderExecutor;
use crate::core::config::{RenderDefaults, RenderOverrides, RenderPlan};
use crate::core::error::Result;
use crate::core::render;
use crate::core::templating::ENGINE_GO;
use clap::{Args, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Options shared by `render` and `entrypoint`.
#[derive(Args, Debug, Clone)]
pub struct RenderOptions {
    /// EXPERIMENTAL pre-render script path.
    #[arg(short = 'p', long = "pre-render", value_name = "SCRIPT")]
    pub pre_render: Option<PathBuf>,

    /// Seconds to wait for the pre-render script before killing it.
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub pre_render_timeout: u64,

    /// Default template engine (go, mustache).
    #[arg(short = 'e', long, value_name = "ENGINE", default_value = ENGINE_GO)]
    pub default_tpl_engine: String,

    /// Default template path.
    #[arg(short = 't', long, value_name = "PATH")]
    pub default_tpl_path: Option<String>,

    /// Default config path.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub default_cfg_path: Option<String>,
}

impl RenderOptions {
    pub fn defaults(&self) -> RenderDefaults {
        RenderDefaults {
            engine: self.default_tpl_engine.clone(),
            template_path: self.default_tpl_path.clone().unwrap_or_default(),
            config_path: self.default_cfg_path.clone().unwrap_or_default(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    about = "Render configuration from template file",
    long_about = "Render configuration from template file. By default, the template\n\
                  is rendered to stdout."
)]
pub struct RenderArgs {
    /// Template path; overrides RDCT_TPL_PATH and friends.
    #[arg(value_name = "TEMPLATE_PATH")]
    pub template_path: Option<String>,

    /// File path to render to.
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<String>,

    #[command(flatten)]
    pub options: RenderOptions,
}

pub async fn handle_render(args: RenderArgs, session: &mut Session) -> Result<()> {
    debug!("Render args: {:?}", args);
    apply_pre_render(&args.options, session).await?;

    let overrides = RenderOverrides {
        template_path: args.template_path,
        config_path: args.out,
    };
    let plan = RenderPlan::resolve(
        &session.env,
        &session.env_prefix,
        &args.options.defaults(),
        &overrides,
    );
    let template = plan.require_template_path()?;

    match plan.config_path() {
        None => {
            info!("rendering template {}", template.display());
            render::render_to_stdout(&session.env, &template, &plan.engine)
        }
        Some(config) => {
            info!(
                "rendering template {} to {}",
                template.display(),
                config.display()
            );
            render::render_to_file(&session.env, &template, &config, &plan.engine)
        }
    }
}

/// Runs the pre-render script, if one was given, and merges what it exported
/// into the session environment.
pub async fn apply_pre_render(options: &RenderOptions, session: &mut Session) -> Result<()> {
    let Some(script) = options.pre_render.as_deref() else {
        return Ok(());
    };
    info!("executing pre-render script {}", script.display());

    let executor = PreRenderExecutor::new(session.env.to_map())
        .with_timeout(Duration::from_secs(options.pre_render_timeout));
    let output = executor.run(script).await?;

    if !output.stdout.is_empty() {
        info!("{}", output.stdout.trim_end());
    }
    if !output.stderr.is_empty() {
        debug!("pre-render stderr: {}", output.stderr.trim_end());
    }
    session.env.merge(output.env);
    Ok(())
}
