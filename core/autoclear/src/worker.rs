//! `autoclear worker <SECONDS>`: the background loop spawned by `start`.
//!
//! Exits cleanly on SIGTERM/SIGINT once the current tick or sleep slice
//! finishes. SIGKILL ends it wherever it is; the controller cleans up.

use std::time::Duration;

use autoclear_core::worker as worker_loop;
use autoclear_core::{AutoclearConfig, AutoclearError, ClearTerminal, Result, ShutdownFlag};

pub fn run(config: &AutoclearConfig, seconds: u64) -> Result<()> {
    let shutdown = ShutdownFlag::new();
    shutdown
        .register_signals()
        .map_err(|e| AutoclearError::Io {
            context: "Failed to register termination handlers".to_string(),
            source: e,
        })?;

    tracing::info!(pid = std::process::id(), seconds, "Worker started");
    let exit = worker_loop::run(
        Duration::from_secs(seconds),
        &mut ClearTerminal,
        &shutdown,
        &config.worker,
    );
    tracing::info!(ticks = exit.ticks, skipped = exit.skipped, "Worker exiting");
    Ok(())
}
