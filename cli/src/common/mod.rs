//! # ReDACT Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared helpers used by the command handlers and the core:
//!
//! - **`fs`**: directory creation and the staged (all-or-nothing) file writer.
//! - **`process`**: runs pre-render shell scripts and captures what they export.
//! - **`privilege`**: resolves a USERSPEC and execs a command as that user.
//!
pub mod fs;
pub mod privilege;
pub mod process;
