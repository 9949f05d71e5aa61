//! # ReDACT Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Core components shared by every command:
//! - `config`: reserved `RDCT_*` keys and render plan resolution
//! - `env`: the `EnvStore` snapshot of the environment
//! - `error`: `RedactError` and the crate `Result`
//! - `render`: render a template to a writer, stdout or a file
//! - `templating`: the template engines
//!
//! ## Usage
//!
//! ```rust
//! use crate::core::env::EnvStore;
//! use crate::core::error::{RedactError, Result};
//! use crate::core::render;
//! ```
//!
pub mod config;
pub mod env;
pub mod error;
pub mod render;
pub mod templating;
