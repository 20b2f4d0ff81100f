//! # autoclear-core
//!
//! Lifecycle control for the autoclear worker: a single background process
//! that clears the operator's terminal on a fixed interval.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. The controller blocks only while
//!   waiting for a terminating worker, bounded by configured timeouts.
//! - **Evidence over bookkeeping**: The live process scan decides whether a
//!   worker runs; the PID record is a hint.
//! - **Injectable host**: Process enumeration, signalling and spawning sit
//!   behind traits in [`process`] so tests run against synthetic process tables.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use autoclear_core::{Controller, ControllerConfig, ScriptedPrompt};
//!
//! let controller = Controller::new(ControllerConfig::default())?;
//! let report = controller.start("10", &mut ScriptedPrompt::default())?;
//! println!("PID: {}", report.pid);
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod interval;
pub mod pid_record;
pub mod process;
pub mod worker;

pub use config::{load_config, AutoclearConfig, ControllerConfig, WorkerConfig, WorkerSignature};
pub use controller::{
    Controller, ReconciledStatus, StartReport, StopReport, TerminationOutcome,
};
pub use error::{AutoclearError, Result};
pub use format::format_duration;
pub use interval::{resolve_interval, IntervalChoice, IntervalPrompt, ScriptedPrompt};
pub use pid_record::PidRecordStore;
pub use process::{
    ExecutableLauncher, ProcessEntry, ProcessScanner, ProcessSignaller, SignalOutcome,
    SystemProcesses, WorkerLauncher,
};
pub use worker::{ClearTerminal, PeriodicAction, ShutdownFlag, WorkerExit};
