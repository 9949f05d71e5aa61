//! # ReDACT Renderer
//!
//! File: cli/src/core/render.rs
//!
//! ## Overview
//!
//! Orchestrates one render: take the variables from the `EnvStore`, pick the
//! engine by name, read the template, render it in memory and hand the result
//! to a sink. Three sinks are supported: any `Write`, stdout, and a file.
//!
//! ## Architecture
//!
//! - The template is always rendered fully into memory before anything is
//!   written, so a failing render never emits partial output.
//! - File output goes through `common::fs::io::StagedFile`: the rendered text
//!   lands in a temporary file next to the destination (behind a 1 MiB
//!   buffer) and is renamed over the destination only after everything
//!   succeeded. A failed render leaves the destination absent or unchanged,
//!   and creates no directories.
//! - The first error from any stage is returned. Nothing here exits the process.
//!
use crate::common::fs::io::StagedFile;
use crate::core::env::EnvStore;
use crate::core::error::Result;
use crate::core::templating::{self, Template};
use anyhow::Context;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

/// Capacity of the buffer in front of staged config files (1 MiB).
pub const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// Renders `template_path` with `engine_name` into memory.
pub fn render_to_string(store: &EnvStore, template_path: &Path, engine_name: &str) -> Result<String> {
    let engine = templating::engine_for(engine_name)?;
    let rendered = Template::new(template_path, store.vars(), engine).render()?;
    debug!(
        "Rendered {} bytes from '{}'",
        rendered.len(),
        template_path.display()
    );
    Ok(rendered)
}

/// Renders `template_path` with `engine_name` into `sink`.
pub fn render_to_writer<W: Write + ?Sized>(
    store: &EnvStore,
    template_path: &Path,
    engine_name: &str,
    sink: &mut W,
) -> Result<()> {
    let rendered = render_to_string(store, template_path, engine_name)?;
    sink.write_all(rendered.as_bytes())
        .context("Failed to write rendered template")?;
    Ok(())
}

/// Renders to stdout.
pub fn render_to_stdout(store: &EnvStore, template_path: &Path, engine_name: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    render_to_writer(store, template_path, engine_name, &mut handle)?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Renders to `config_path`, replacing it only if the whole render succeeds.
pub fn render_to_file(
    store: &EnvStore,
    template_path: &Path,
    config_path: &Path,
    engine_name: &str,
) -> Result<()> {
    // Nothing touches the filesystem until the render has succeeded.
    let rendered = render_to_string(store, template_path, engine_name)?;
    let mut staged = StagedFile::create(config_path, WRITE_BUFFER_SIZE)?;
    staged
        .writer()
        .write_all(rendered.as_bytes())
        .context("Failed to write rendered template")?;
    staged.commit()?;
    info!(
        "Wrote '{}' from template '{}'",
        config_path.display(),
        template_path.display()
    );
    Ok(())
}
