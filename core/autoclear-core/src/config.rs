//! Configuration for the controller and the worker.
//!
//! Every path and timing constant the lifecycle code needs is carried here and
//! passed in at construction, so tests can point the controller at temp
//! directories and millisecond timeouts without touching shared state.
//!
//! ## Sources
//!
//! 1. Built-in defaults (`AutoclearConfig::default()`)
//! 2. Optional TOML file: explicit path, else `$AUTOCLEAR_CONFIG`, else
//!    `~/.autoclear/config.toml`
//! 3. `$AUTOCLEAR_PID_FILE` overrides `controller.pid_file`

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AutoclearError, Result};

pub const CONFIG_ENV: &str = "AUTOCLEAR_CONFIG";
pub const PID_FILE_ENV: &str = "AUTOCLEAR_PID_FILE";
pub const DEFAULT_PID_FILE: &str = "autoclear.pid";

/// Root directory for autoclear's own files (config, logs).
pub fn autoclear_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".autoclear"))
}

/// Default location of the optional config file.
pub fn default_config_path() -> Option<PathBuf> {
    autoclear_home().map(|root| root.join("config.toml"))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoclearConfig {
    pub controller: ControllerConfig,
    pub worker: WorkerConfig,
}

impl AutoclearConfig {
    /// Applies `$AUTOCLEAR_PID_FILE`, if set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(pid_file) = env::var_os(PID_FILE_ENV) {
            self.controller.pid_file = PathBuf::from(pid_file);
        }
    }
}

/// Identifies worker processes in the host process table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerSignature {
    /// Case-insensitive substring of the process name.
    pub executable: String,
    /// Argument that marks a worker invocation; also the subcommand the
    /// launcher passes to the spawned executable.
    pub marker: String,
}

impl Default for WorkerSignature {
    fn default() -> Self {
        Self {
            executable: "autoclear".to_string(),
            marker: "worker".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub pid_file: PathBuf,
    pub default_interval_secs: u64,
    /// Re-prompts allowed after the first invalid interval.
    pub max_interval_retries: u32,
    pub stop_timeout_ms: u64,
    pub kill_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub signature: WorkerSignature,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pid_file: PathBuf::from(DEFAULT_PID_FILE),
            default_interval_secs: 600,
            max_interval_retries: 2,
            stop_timeout_ms: 3_000,
            kill_timeout_ms: 1_000,
            poll_interval_ms: 50,
            signature: WorkerSignature::default(),
        }
    }
}

impl ControllerConfig {
    /// Builds a config whose PID record lives at `pid_file`.
    pub fn with_pid_file(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
            ..Self::default()
        }
    }

    pub fn default_interval(&self) -> Duration {
        Duration::from_secs(self.default_interval_secs)
    }

    /// Default interval in whole minutes, as the CLI accepts it.
    pub fn default_minutes(&self) -> u64 {
        (self.default_interval_secs / 60).max(1)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Immediate attempts per tick before the tick is skipped.
    pub action_attempts: u32,
    pub startup_delay_ms: u64,
    pub shutdown_poll_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            action_attempts: 3,
            startup_delay_ms: 2_000,
            shutdown_poll_ms: 250,
        }
    }
}

impl WorkerConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn shutdown_poll(&self) -> Duration {
        Duration::from_millis(self.shutdown_poll_ms.max(1))
    }
}

/// Loads configuration, returning defaults when no config file exists.
///
/// `$AUTOCLEAR_PID_FILE` is applied on top of whatever the file says.
pub fn load_config(path: Option<PathBuf>) -> Result<AutoclearConfig> {
    let config_path = path
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
        .or_else(default_config_path);

    let mut config = match config_path {
        Some(path) => read_config_file(&path)?,
        None => AutoclearConfig::default(),
    };
    config.apply_env_overrides();
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<AutoclearConfig> {
    if !path.exists() {
        return Ok(AutoclearConfig::default());
    }

    let content =
        fs_err::read_to_string(path).map_err(|err| AutoclearError::ConfigMalformed {
            path: path.to_path_buf(),
            details: err.to_string(),
        })?;
    toml::from_str::<AutoclearConfig>(&content).map_err(|err| AutoclearError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}
