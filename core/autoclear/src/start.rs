//! `autoclear start`: spawn the worker unless one is already running.

use autoclear_core::{format_duration, AutoclearConfig, Controller, IntervalChoice, Result};

use crate::prompt::TerminalPrompt;

pub fn run(config: &AutoclearConfig, minutes: Option<&str>) -> Result<()> {
    let controller = Controller::new(config.controller.clone())?;
    let requested = minutes
        .map(str::to_string)
        .unwrap_or_else(|| config.controller.default_minutes().to_string());

    let report = controller.start(&requested, &mut TerminalPrompt)?;

    match report.interval {
        IntervalChoice::Requested(interval) => println!(
            "autoclear starting with '{}' interval",
            format_duration(interval.as_secs())
        ),
        IntervalChoice::Fallback(interval) => println!(
            "maximum attempts reached. defaulting to '{}' interval",
            format_duration(interval.as_secs())
        ),
    }
    println!("PID: {}", report.pid);
    Ok(())
}
