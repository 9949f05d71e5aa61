//! # ReDACT Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout ReDACT. Each failure
//! mode of the render pipeline has its own `RedactError` variant so callers
//! (and tests) can tell them apart with `downcast_ref`, while command handlers
//! propagate everything as `anyhow::Result` with added context.
//!
//! ## Architecture
//!
//! - `RedactError`: a `thiserror` enum, one variant per failure kind:
//!   - resolution misses (`KeyNotFound`, recovered internally by the precedence chain)
//!   - engine selection (`UnsupportedEngine`)
//!   - template parsing and rendering (`TemplateSyntax`, `TemplateExecution`)
//!   - pre-render scripts (`ScriptExecutionFailed`)
//!   - filesystem access (`Io`)
//!   - missing required settings (`Config`)
//!   - privileged exec (`Exec`)
//! - `Result<T>`: alias for `anyhow::Result<T>`.
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! return Err(RedactError::UnsupportedEngine { name: name.to_string() })?;
//!
//! // Match on the error kind further up
//! if let Some(RedactError::TemplateSyntax { .. }) = err.downcast_ref::<RedactError>() {
//!     // ...
//! }
//! ```
//!
//! Nothing in the core calls `std::process::exit`; `main` owns the exit code.
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for the ReDACT application.
#[derive(Error, Debug)]
pub enum RedactError {
    #[error("Key '{key}' does not exist")]
    KeyNotFound { key: String },

    #[error("Invalid template engine: {name} (expected 'go' or 'mustache')")]
    UnsupportedEngine { name: String },

    #[error("Template syntax error ({engine} engine): {message}")]
    TemplateSyntax {
        engine: &'static str,
        message: String,
    },

    #[error("Template execution error ({engine} engine): {message}")]
    TemplateExecution {
        engine: &'static str,
        message: String,
    },

    #[error("Pre-render script '{script}' failed: {details}")]
    ScriptExecutionFailed { script: String, details: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Exec error: {0}")]
    Exec(String),
}

impl RedactError {
    /// Builds a `ScriptExecutionFailed` from the script's captured stderr and
    /// the underlying process failure, joined into one message.
    pub fn script_failed(script: impl Into<String>, stderr: &str, reason: impl AsRef<str>) -> Self {
        let stderr = stderr.trim_end();
        let details = if stderr.is_empty() {
            reason.as_ref().to_string()
        } else {
            format!("{}\n{}", stderr, reason.as_ref())
        };
        RedactError::ScriptExecutionFailed {
            script: script.into(),
            details,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RedactError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

/// Flattens an error and its `source()` chain into a single line.
///
/// Template engines report the useful part (line, column, missing variable)
/// in nested sources, which a plain `to_string()` would drop.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
