//! Host process capabilities used by the lifecycle controller.
//!
//! The controller never talks to the OS directly. It goes through three seams
//! so tests can substitute synthetic process tables:
//!
//! - [`ProcessScanner`]: enumerate processes, check liveness
//! - [`ProcessSignaller`]: graceful and forced termination
//! - [`WorkerLauncher`]: spawn a detached worker
//!
//! [`SystemProcesses`] and [`ExecutableLauncher`] are the real implementations.

mod launch;
mod scan;
mod signal;

use std::io;
use std::path::Path;

pub use launch::ExecutableLauncher;
pub use scan::{classify_workers, is_worker, SystemProcesses};
pub use signal::wait_for_exit;

/// One row of the host process table, as seen by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cmd: Vec<String>,
}

impl ProcessEntry {
    pub fn new(pid: u32, name: impl Into<String>, cmd: &[&str]) -> Self {
        Self {
            pid,
            name: name.into(),
            cmd: cmd.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

/// Read-only view of the host process table.
///
/// Implementations skip processes that vanish mid-scan or whose details are
/// not accessible; neither is an error.
pub trait ProcessScanner: Send + Sync {
    /// Every process visible to the current user.
    fn snapshot(&self) -> Vec<ProcessEntry>;

    /// Whether `pid` currently names a live process.
    /// A process we lack permission to inspect still counts as alive.
    fn is_alive(&self, pid: u32) -> bool;
}

/// Result of delivering a termination request to one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    Delivered,
    NoSuchProcess,
    PermissionDenied,
    Failed(String),
}

pub trait ProcessSignaller: Send + Sync {
    /// Ask the process to exit (SIGTERM on unix).
    fn terminate(&self, pid: u32) -> SignalOutcome;

    /// Kill the process outright (SIGKILL on unix).
    fn force_kill(&self, pid: u32) -> SignalOutcome;
}

/// Spawns the worker as a new, detached OS process.
pub trait WorkerLauncher: Send + Sync {
    /// Starts a worker ticking every `interval_secs` and returns its pid.
    fn launch(&self, interval_secs: u64) -> io::Result<u32>;

    /// Program the launcher runs, for diagnostics.
    fn program(&self) -> &Path;
}
