//! Tracing setup for controller and worker invocations.
//!
//! Controller commands log to stderr (default level `warn`). The worker shares
//! the operator's terminal and clears it, so it logs to
//! `~/.autoclear/logs/worker.log` instead.

use std::env;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "AUTOCLEAR_DEBUG_LOG";
const LOG_DIR: &str = "logs";
const WORKER_LOG_FILE: &str = "worker.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    WorkerFile,
}

/// Installs the global subscriber. Keep the returned guard alive for the
/// process lifetime so buffered worker log lines are flushed.
pub fn init(target: LogTarget) -> Option<WorkerGuard> {
    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("warn"))
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
            None
        }
        LogTarget::WorkerFile => {
            // No home directory: run without logging rather than write to the terminal
            let dir = autoclear_core::config::autoclear_home()?.join(LOG_DIR);
            fs_err::create_dir_all(&dir).ok()?;

            let appender = tracing_appender::rolling::never(&dir, WORKER_LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("info"))
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    if debug_enabled() {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| {
            matches!(
                value.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            )
        })
        .unwrap_or(false)
}
