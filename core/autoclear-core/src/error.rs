//! Error types for autoclear-core operations.
//!
//! Only operation-level failures live here. Conditions the controller recovers
//! from locally (malformed PID record, vanished processes, permission denied
//! while scanning, invalid interval input) are logged and absorbed instead.

use std::path::PathBuf;

/// All errors that can surface from a controller operation.
#[derive(Debug, thiserror::Error)]
pub enum AutoclearError {
    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("autoclear already running with PID:{}", display_pid(.main_pid))]
    AlreadyRunning { main_pid: Option<u32> },

    #[error("autoclear is not running")]
    NotRunning,

    #[error("Failed to stop autoclear")]
    StopFailed { targets: usize },

    #[error("Failed to spawn worker {program}: {source}")]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("user quits")]
    Cancelled,

    // ─────────────────────────────────────────────────────────────────────
    // I/O and Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },
}

impl AutoclearError {
    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

fn display_pid(pid: &Option<u32>) -> String {
    pid.map_or_else(|| "None".to_string(), |pid| pid.to_string())
}

/// Convenience type alias for Results using AutoclearError.
pub type Result<T> = std::result::Result<T, AutoclearError>;
