//! # ReDACT Entrypoint Handler
//!
//! File: cli/src/commands/entrypoint.rs
//!
//! ## Overview
//!
//! Implements `redact entrypoint [OPTIONS] -- USERSPEC COMMAND [ARGS...]`, the
//! intended `ENTRYPOINT` of a container image:
//!
//! 1. Run the pre-render script, if any, and merge its exports.
//! 2. Resolve engine, template path and config path. Both paths are required
//!    and come only from the environment or the `--default-*` flags.
//! 3. Render the template to the config file.
//! 4. Exec `COMMAND` as `USERSPEC`.
//!
//! ## Usage
//!
//! ```dockerfile
//! ENV RDCT_DEFAULT_TPL_PATH=/etc/app/app.conf.tmpl
//! ENV RDCT_DEFAULT_CFG_PATH=/etc/app/app.conf
//! ENTRYPOINT ["redact", "entrypoint", "--", "app:app", "/usr/bin/app"]
//! ```
//!
use crate::commands::render::{apply_pre_render, RenderOptions};
use crate::commands::Session;
use crate::common::privilege;
use crate::core::config::{RenderOverrides, RenderPlan};
use crate::core::error::Result;
use crate::core::render;
use clap::Parser;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    about = "Renders configuration then executes a command",
    long_about = "Renders configuration then executes a command.\n\n\
                  USERSPEC should be: <user or uid> or <user or uid>:<group or gid>\n\n\
                  Example: redact entrypoint -- nobody id\n         \
                  or\n         \
                  redact entrypoint -- nobody:root id"
)]
pub struct EntrypointArgs {
    #[command(flatten)]
    pub options: RenderOptions,

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

pub async fn handle_entrypoint(args: EntrypointArgs, session: &mut Session) -> Result<()> {
    debug!("Entrypoint args: {:?}", args);
    apply_pre_render(&args.options, session).await?;

    let plan = RenderPlan::resolve(
        &session.env,
        &session.env_prefix,
        &args.options.defaults(),
        &RenderOverrides::default(),
    );
    let template = plan.require_template_path()?;
    let config = plan.require_config_path()?;

    info!(
        "rendering template {} to {}",
        template.display(),
        config.display()
    );
    render::render_to_file(&session.env, &template, &config, &plan.engine)?;

    Err(privilege::exec(&args.userspec, &args.command).into())
}
