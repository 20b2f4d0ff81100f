//! Single-slot PID record for the worker the controller last spawned.
//!
//! The record is a small file holding the decimal pid and nothing else. It is
//! advisory: it may point at a process that has since exited, or be missing
//! while a worker is alive. Callers cross-check it against a live scan.
//!
//! No cross-process locking is attempted; commands are expected to be issued
//! one at a time by a single operator.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{AutoclearError, Result};

#[derive(Debug, Clone)]
pub struct PidRecordStore {
    path: PathBuf,
}

impl PidRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the recorded pid.
    ///
    /// A missing file, unreadable file, or content that is not a positive
    /// integer all read as `None`.
    pub fn read(&self) -> Option<u32> {
        let content = match fs_err::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::debug!(error = %err, "PID record unreadable, treating as absent");
                return None;
            }
        };

        match content.trim().parse::<u32>() {
            Ok(0) | Err(_) => {
                tracing::debug!(
                    path = %self.path.display(),
                    "PID record malformed, treating as absent"
                );
                None
            }
            Ok(pid) => Some(pid),
        }
    }

    /// Replaces the record with `pid`.
    ///
    /// Writes to a temp file in the same directory and renames it into place,
    /// so a concurrent `read` sees either the old value or the new one.
    pub fn write(&self, pid: u32) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs_err::create_dir_all(dir).map_err(|e| AutoclearError::Io {
            context: format!("Failed to create PID record directory {}", dir.display()),
            source: e,
        })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AutoclearError::Io {
            context: "Failed to create temp PID record".to_string(),
            source: e,
        })?;
        tmp.write_all(pid.to_string().as_bytes())
            .map_err(|e| AutoclearError::Io {
                context: "Failed to write temp PID record".to_string(),
                source: e,
            })?;
        tmp.flush().map_err(|e| AutoclearError::Io {
            context: "Failed to flush temp PID record".to_string(),
            source: e,
        })?;
        tmp.persist(&self.path).map_err(|e| AutoclearError::Io {
            context: format!("Failed to persist PID record {}", self.path.display()),
            source: e.error,
        })?;

        tracing::debug!(pid, path = %self.path.display(), "PID record written");
        Ok(())
    }

    /// Removes the record. A record that does not exist is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs_err::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AutoclearError::Io {
                context: "Failed to remove PID record".to_string(),
                source: err,
            }),
        }
    }
}
