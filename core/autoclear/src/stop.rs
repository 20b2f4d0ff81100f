//! `autoclear stop`: terminate every known worker.

use autoclear_core::{AutoclearConfig, Controller, Result};

pub fn run(config: &AutoclearConfig) -> Result<()> {
    let controller = Controller::new(config.controller.clone())?;
    let report = controller.stop()?;
    println!("Stopped {} autoclear process(es)", report.stopped_count());
    Ok(())
}
