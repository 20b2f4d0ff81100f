//! autoclear: clears the terminal on a fixed interval from a background worker.
//!
//! ## Subcommands
//!
//! - `start`: spawn the worker (refuses if one is already running)
//! - `stop`: terminate every known worker and drop the PID record
//! - `status`: report whether a worker is running
//! - `worker`: the worker loop itself (spawned internally by `start`)
//!
//! Running without a subcommand is `start` with the default interval.

mod logging;
mod prompt;
mod start;
mod status;
mod stop;
mod worker;

use autoclear_core::AutoclearConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autoclear")]
#[command(about = "Auto-clear terminal controller")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the background worker
    Start {
        /// Minutes between clears (default: 10)
        #[arg(short = 't', long = "time", value_name = "MINUTES")]
        minutes: Option<String>,
    },

    /// Stop the background worker
    Stop,

    /// Show whether the worker is running
    Status {
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Worker loop (spawned by start)
    #[command(hide = true)]
    Worker {
        /// Seconds between clears
        #[arg(value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
        seconds: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let target = match cli.command {
        Some(Commands::Worker { .. }) => logging::LogTarget::WorkerFile,
        _ => logging::LogTarget::Stderr,
    };
    let _logging_guard = logging::init(target);
    let config = load_config();

    let result = match cli.command {
        None => start::run(&config, None),
        Some(Commands::Start { minutes }) => start::run(&config, minutes.as_deref()),
        Some(Commands::Stop) => stop::run(&config),
        Some(Commands::Status { json }) => status::run(&config, json),
        Some(Commands::Worker { seconds }) => worker::run(&config, seconds),
    };

    if let Err(err) = result {
        tracing::debug!(error = ?err, "autoclear command failed");
        eprintln!("{}", err);
        std::process::exit(err.exit_code());
    }
}

fn load_config() -> AutoclearConfig {
    match autoclear_core::load_config(None) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to load autoclear config; using defaults");
            let mut config = AutoclearConfig::default();
            config.apply_env_overrides();
            config
        }
    }
}
