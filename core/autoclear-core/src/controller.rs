//! Lifecycle controller for the autoclear worker.
//!
//! Exposes `status`, `start` and `stop`. Nothing is cached between calls:
//! every operation rebuilds its view from two sources of evidence.
//!
//! - **Live scan**: worker-shaped processes in the host process table
//! - **PID record**: the pid written by the last successful `start`
//!
//! The live scan is authoritative. The record is a hint that may be stale
//! (process exited, pid possibly reused) or missing (file deleted externally).
//!
//! # Invariants
//!
//! - At most one worker is spawned per `start`, and only when the live scan
//!   finds none.
//! - The controller's own pid never appears in the live set.
//! - After `stop` returns, successfully or not, the record file is gone.
//! - `stop` targets the union of the record and the live set, so a worker
//!   missing from either source is still terminated.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ControllerConfig;
use crate::error::{AutoclearError, Result};
use crate::interval::{resolve_interval, IntervalChoice, IntervalPrompt};
use crate::pid_record::PidRecordStore;
use crate::process::{
    classify_workers, wait_for_exit, ExecutableLauncher, ProcessScanner, ProcessSignaller,
    SignalOutcome, SystemProcesses, WorkerLauncher,
};

/// Reconciled view of the worker, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledStatus {
    pub is_running: bool,
    pub pids: Vec<u32>,
    /// The recorded pid, only if it still names a live process.
    pub main_pid: Option<u32>,
}

impl fmt::Display for ReconciledStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Status: {}",
            if self.is_running { "Running" } else { "Stopped" }
        )?;
        writeln!(f, "Processes: {}", self.pids.len())?;
        match self.main_pid {
            Some(pid) => write!(f, "Main PID: {}", pid),
            None => write!(f, "Main PID: None"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartReport {
    pub pid: u32,
    pub interval: IntervalChoice,
}

/// What happened to one stop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// Exited within the graceful timeout.
    Terminated,
    /// Ignored the graceful request and was killed.
    ForceKilled,
    /// Already gone before or while we signalled it.
    Vanished,
    /// Owned by someone we may not signal.
    Denied,
    /// Still alive after the forced kill.
    Survived,
}

impl TerminationOutcome {
    pub fn stopped(self) -> bool {
        matches!(self, Self::Terminated | Self::ForceKilled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    pub outcomes: Vec<(u32, TerminationOutcome)>,
}

impl StopReport {
    pub fn stopped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.stopped())
            .count()
    }
}

pub struct Controller {
    config: ControllerConfig,
    record: PidRecordStore,
    scanner: Arc<dyn ProcessScanner>,
    signaller: Arc<dyn ProcessSignaller>,
    launcher: Arc<dyn WorkerLauncher>,
    self_pid: u32,
}

impl Controller {
    /// Controller over the real host, launching the current executable.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        let launcher =
            ExecutableLauncher::current_exe(config.signature.marker.clone()).map_err(|e| {
                AutoclearError::Io {
                    context: "Failed to resolve current executable".to_string(),
                    source: e,
                }
            })?;
        let host = Arc::new(SystemProcesses::new());
        Ok(Self::with_parts(
            config,
            host.clone(),
            host,
            Arc::new(launcher),
        ))
    }

    /// Controller over injected capabilities.
    pub fn with_parts(
        config: ControllerConfig,
        scanner: Arc<dyn ProcessScanner>,
        signaller: Arc<dyn ProcessSignaller>,
        launcher: Arc<dyn WorkerLauncher>,
    ) -> Self {
        let record = PidRecordStore::new(config.pid_file.clone());
        Self {
            config,
            record,
            scanner,
            signaller,
            launcher,
            self_pid: std::process::id(),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn record(&self) -> &PidRecordStore {
        &self.record
    }

    /// Live worker pids, excluding this process.
    pub fn scan(&self) -> Vec<u32> {
        classify_workers(
            &self.scanner.snapshot(),
            &self.config.signature,
            self.self_pid,
        )
    }

    /// The recorded pid, unless it now belongs to this process.
    fn recorded_pid(&self) -> Option<u32> {
        self.record.read().filter(|pid| {
            if *pid == self.self_pid {
                tracing::debug!(pid, "PID record points at this process");
                return false;
            }
            true
        })
    }

    /// Reconciles the live scan with the PID record. Read-only: a stale
    /// record is reported as absent but left on disk.
    pub fn status(&self) -> ReconciledStatus {
        let pids = self.scan();
        let main_pid = self.recorded_pid().filter(|pid| {
            let alive = self.scanner.is_alive(*pid);
            if !alive {
                tracing::debug!(pid, "PID record is stale");
            }
            alive
        });

        ReconciledStatus {
            is_running: !pids.is_empty(),
            pids,
            main_pid,
        }
    }

    /// Spawns a worker unless one is already running.
    ///
    /// `requested_minutes` goes through [`resolve_interval`]; `prompt`
    /// supplies corrections for invalid values.
    pub fn start(
        &self,
        requested_minutes: &str,
        prompt: &mut dyn IntervalPrompt,
    ) -> Result<StartReport> {
        let status = self.status();
        if status.is_running {
            tracing::info!(pids = ?status.pids, "Start refused, worker already running");
            return Err(AutoclearError::AlreadyRunning {
                main_pid: status.main_pid,
            });
        }

        self.record.clear()?;

        let interval = resolve_interval(
            requested_minutes,
            self.config.max_interval_retries,
            self.config.default_interval(),
            prompt,
        )?;

        let interval_secs = interval.duration().as_secs();
        let pid = self
            .launcher
            .launch(interval_secs)
            .map_err(|e| AutoclearError::SpawnFailed {
                program: self.launcher.program().to_path_buf(),
                source: e,
            })?;
        self.record.write(pid)?;

        tracing::info!(pid, interval_secs, fallback = interval.is_fallback(), "Worker started");
        Ok(StartReport { pid, interval })
    }

    /// Terminates every known worker and removes the PID record.
    pub fn stop(&self) -> Result<StopReport> {
        let recorded = self.recorded_pid();
        let status = self.status();

        if !status.is_running && status.main_pid.is_none() {
            self.clear_record_after_stop();
            return Err(AutoclearError::NotRunning);
        }

        let targets: BTreeSet<u32> = recorded.into_iter().chain(status.pids).collect();
        let outcomes: Vec<(u32, TerminationOutcome)> = targets
            .iter()
            .map(|&pid| (pid, self.terminate(pid)))
            .collect();

        self.clear_record_after_stop();

        let report = StopReport { outcomes };
        if report.stopped_count() == 0 {
            tracing::warn!(outcomes = ?report.outcomes, "No worker could be stopped");
            return Err(AutoclearError::StopFailed {
                targets: targets.len(),
            });
        }
        Ok(report)
    }

    /// Graceful request, bounded wait, then forced kill.
    fn terminate(&self, pid: u32) -> TerminationOutcome {
        if !self.scanner.is_alive(pid) {
            tracing::debug!(pid, "Stop target already gone");
            return TerminationOutcome::Vanished;
        }

        match self.signaller.terminate(pid) {
            SignalOutcome::Delivered => {}
            SignalOutcome::NoSuchProcess => return TerminationOutcome::Vanished,
            SignalOutcome::PermissionDenied => {
                tracing::debug!(pid, "Not permitted to signal stop target");
                return TerminationOutcome::Denied;
            }
            SignalOutcome::Failed(err) => {
                // Escalate anyway; the kill below decides the outcome
                tracing::warn!(pid, error = %err, "Graceful termination request failed");
            }
        }

        let poll = self.config.poll_interval();
        if wait_for_exit(self.scanner.as_ref(), pid, self.config.stop_timeout(), poll) {
            tracing::info!(pid, "Worker terminated");
            return TerminationOutcome::Terminated;
        }

        match self.signaller.force_kill(pid) {
            SignalOutcome::Delivered => {}
            // Exited between the timeout and the kill
            SignalOutcome::NoSuchProcess => return TerminationOutcome::Terminated,
            SignalOutcome::PermissionDenied => return TerminationOutcome::Denied,
            SignalOutcome::Failed(err) => {
                tracing::warn!(pid, error = %err, "Forced kill failed");
            }
        }

        if wait_for_exit(self.scanner.as_ref(), pid, self.config.kill_timeout(), poll) {
            tracing::info!(pid, "Worker force-killed after ignoring termination request");
            TerminationOutcome::ForceKilled
        } else {
            tracing::warn!(pid, "Worker still alive after forced kill");
            TerminationOutcome::Survived
        }
    }

    fn clear_record_after_stop(&self) {
        if let Err(err) = self.record.clear() {
            tracing::warn!(
                error = %err,
                path = %self.record.path().display(),
                "Failed to remove PID record"
            );
        }
    }
}
