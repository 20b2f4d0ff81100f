//! `autoclear status`: reconciled view of the worker.

use autoclear_core::{AutoclearConfig, AutoclearError, Controller, Result};

pub fn run(config: &AutoclearConfig, json: bool) -> Result<()> {
    let controller = Controller::new(config.controller.clone())?;
    let status = controller.status();

    if json {
        let rendered = serde_json::to_string_pretty(&status).map_err(|e| AutoclearError::Io {
            context: "Failed to serialize status".to_string(),
            source: e.into(),
        })?;
        println!("{}", rendered);
    } else {
        println!("{}", status);
    }
    Ok(())
}
