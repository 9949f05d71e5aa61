//! # ReDACT Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! Filesystem helpers for writing rendered configuration safely:
//!
//! - **`ensure_dir_exists`**: creates a directory (and its parents) if missing,
//!   and rejects paths that exist but are not directories.
//! - **`StagedFile`**: a two-phase file writer. Content goes into a temporary
//!   file in the destination's directory; `commit` flushes, syncs and renames
//!   it over the destination. Dropping a `StagedFile` without committing
//!   deletes the temporary file and leaves the destination untouched.
//!
//! Downstream consumers of a config file therefore see either the previous
//! file, or the complete new one, never a partial render. A destination that
//! is a symlink keeps being one: the file it points to is what gets replaced.
//!
//! ## Usage
//!
//! ```rust
//! let mut staged = StagedFile::create(Path::new("/etc/app/app.conf"), 1024 * 1024)?;
//! staged.writer().write_all(rendered.as_bytes())?;
//! staged.commit()?; // or drop `staged` to discard
//! ```
//!
use crate::core::error::{RedactError, Result};
use anyhow::Context;
use std::fs;
use std::io::{BufWriter, Write};
use std::os::unix::fs::{self as unix_fs, MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Mode given to config files that did not exist before.
const NEW_FILE_MODE: u32 = 0o644;

/// Ensures that a directory exists at the specified path (like `mkdir -p`).
///
/// # Errors
///
/// Returns an `Err` if the path exists but is not a directory, or if creating
/// the directory fails.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| RedactError::io(path, e))
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(RedactError::Config(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// A file that only replaces its destination on `commit`.
#[derive(Debug)]
pub struct StagedFile {
    writer: BufWriter<NamedTempFile>,
    destination: PathBuf,
}

impl StagedFile {
    /// Creates the temporary file next to `destination`, behind a buffer of
    /// `capacity` bytes. Missing parent directories are created.
    ///
    /// An existing destination is resolved through symlinks first, so the
    /// link target is what gets replaced. Its permissions and (when allowed)
    /// ownership carry over to the new file; a new file gets mode 0644.
    pub fn create(destination: &Path, capacity: usize) -> Result<Self> {
        let destination = match fs::canonicalize(destination) {
            Ok(resolved) => resolved,
            Err(_) => destination.to_path_buf(),
        };
        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        ensure_dir_exists(&parent)?;

        let existing = match fs::metadata(&destination) {
            Ok(meta) if meta.is_dir() => {
                anyhow::bail!(RedactError::Config(format!(
                    "Config path is a directory: {:?}",
                    destination
                )));
            }
            Ok(meta) => Some(meta),
            Err(_) => None,
        };

        let temp = tempfile::Builder::new()
            .prefix(".redact-")
            .suffix(".tmp")
            .tempfile_in(&parent)
            .map_err(|e| RedactError::io(&parent, e))
            .with_context(|| format!("Failed to stage {:?}", destination))?;
        let permissions = match &existing {
            Some(meta) => meta.permissions(),
            None => fs::Permissions::from_mode(NEW_FILE_MODE),
        };
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| RedactError::io(temp.path(), e))
            .context("Failed to set permissions on staged file")?;
        if let Some(meta) = &existing {
            // Only root may give a file away; anyone else keeps their own uid.
            if let Err(e) = unix_fs::fchown(temp.as_file(), Some(meta.uid()), Some(meta.gid())) {
                debug!("Keeping staged file owner for {:?}: {}", destination, e);
            }
        }
        debug!(
            "Staging {:?} through {:?}",
            destination,
            temp.path()
        );

        Ok(StagedFile {
            writer: BufWriter::with_capacity(capacity, temp),
            destination,
        })
    }

    pub fn writer(&mut self) -> &mut BufWriter<NamedTempFile> {
        &mut self.writer
    }

    /// Flushes, syncs and renames the staged content over the destination.
    ///
    /// A destination that cannot be renamed over (`EBUSY`, as with a file
    /// bind-mounted into a container) is overwritten in place instead.
    pub fn commit(self) -> Result<()> {
        let destination = self.destination;
        let temp = self
            .writer
            .into_inner()
            .map_err(|e| RedactError::io(&destination, e.into_error()))
            .context("Failed to flush staged file")?;
        temp.as_file()
            .sync_all()
            .map_err(|e| RedactError::io(temp.path(), e))
            .context("Failed to sync staged file")?;
        match temp.persist(&destination) {
            Ok(_) => {}
            Err(e) if e.error.raw_os_error() == Some(libc::EBUSY) => {
                warn!(
                    "{:?} is busy (bind mount?), overwriting it in place",
                    destination
                );
                fs::copy(e.file.path(), &destination)
                    .map_err(|err| RedactError::io(&destination, err))
                    .with_context(|| format!("Failed to overwrite {:?}", destination))?;
            }
            Err(e) => {
                return Err(RedactError::io(&destination, e.error)).with_context(|| {
                    format!("Failed to move staged file into place at {:?}", destination)
                });
            }
        }
        debug!("Committed {:?}", destination);
        Ok(())
    }
}
