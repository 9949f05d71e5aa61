//! # ReDACT Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! Filesystem helpers; see `io` for `ensure_dir_exists` and `StagedFile`.
//!
pub mod io;
