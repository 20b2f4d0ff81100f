//! The supervised worker: run an action, sleep, repeat until told to stop.
//!
//! The loop has no knowledge of the controller. It receives its interval and
//! observes a [`ShutdownFlag`] at every iteration boundary (and while
//! sleeping, at `shutdown_poll` granularity). The flag is raised by SIGTERM or
//! SIGINT once [`ShutdownFlag::register_signals`] has been called; SIGKILL is
//! handled entirely by the host.
//!
//! ## Tick semantics
//!
//! A tick performs the action up to `action_attempts` times back to back. A
//! tick whose attempts all fail is skipped; the loop never ends because an
//! action failed.

use std::io;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::WorkerConfig;

/// The periodic work performed on each tick.
pub trait PeriodicAction {
    fn perform(&mut self) -> Result<(), String>;
}

/// Clears the terminal the worker was started from.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClearTerminal;

const USAGE_HINT: &str =
    "Terminal cleared. \n'autoclear stop' to stop. \n'autoclear status' to check status.";

impl ClearTerminal {
    fn command() -> Command {
        if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.args(["/c", "cls"]);
            command
        } else {
            Command::new("clear")
        }
    }
}

impl PeriodicAction for ClearTerminal {
    fn perform(&mut self) -> Result<(), String> {
        let status = Self::command()
            .status()
            .map_err(|err| format!("Failed to run clear command: {}", err))?;
        if !status.success() {
            return Err(format!("clear command exited with {}", status));
        }
        println!("{}", USAGE_HINT);
        Ok(())
    }
}

/// Cooperative stop request shared between signal handlers and the loop.
#[derive(Debug, Default, Clone)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag on SIGTERM and SIGINT.
    pub fn register_signals(&self) -> io::Result<()> {
        use signal_hook::consts::signal::{SIGINT, SIGTERM};

        for signal in [SIGTERM, SIGINT] {
            signal_hook::flag::register(signal, Arc::clone(&self.requested))?;
        }
        Ok(())
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Summary of a worker run that ended through shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerExit {
    pub ticks: u64,
    pub skipped: u64,
}

/// Runs `action` every `interval` until `shutdown` is requested.
pub fn run(
    interval: Duration,
    action: &mut dyn PeriodicAction,
    shutdown: &ShutdownFlag,
    config: &WorkerConfig,
) -> WorkerExit {
    let mut exit = WorkerExit::default();
    tracing::info!(interval_secs = interval.as_secs(), "Worker loop starting");

    if !sleep_unless_shutdown(config.startup_delay(), shutdown, config.shutdown_poll()) {
        tracing::info!("Shutdown requested before first tick");
        return exit;
    }

    while !shutdown.is_requested() {
        exit.ticks += 1;
        if !tick(action, config.action_attempts) {
            exit.skipped += 1;
        }

        if !sleep_unless_shutdown(interval, shutdown, config.shutdown_poll()) {
            break;
        }
    }

    tracing::info!(ticks = exit.ticks, skipped = exit.skipped, "Worker loop stopped");
    exit
}

/// Performs one tick. Returns false when every attempt failed.
fn tick(action: &mut dyn PeriodicAction, attempts: u32) -> bool {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match action.perform() {
            Ok(()) => return true,
            Err(err) => {
                tracing::debug!(attempt, error = %err, "Periodic action attempt failed");
            }
        }
    }
    tracing::warn!(attempts, "Periodic action failed on every attempt; skipping tick");
    false
}

/// Sleeps for `duration` in `poll` slices. Returns false if shutdown was
/// requested before the full duration elapsed.
///
/// A duration past the clock's range never elapses; only shutdown ends it.
fn sleep_unless_shutdown(duration: Duration, shutdown: &ShutdownFlag, poll: Duration) -> bool {
    let deadline = Instant::now().checked_add(duration);
    loop {
        if shutdown.is_requested() {
            return false;
        }
        let now = Instant::now();
        let slice = match deadline {
            Some(deadline) if now >= deadline => return true,
            Some(deadline) => poll.min(deadline - now),
            None => poll,
        };
        thread::sleep(slice);
    }
}
