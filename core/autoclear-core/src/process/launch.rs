//! Spawning the worker as a detached process.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::WorkerLauncher;

/// Runs `<program> <marker> <seconds>`.
///
/// The worker keeps the operator's stdout/stderr (it clears that terminal) but
/// gets a null stdin and, on unix, its own process group so job-control
/// signals aimed at the controller's foreground group do not reach it.
#[derive(Debug, Clone)]
pub struct ExecutableLauncher {
    program: PathBuf,
    working_dir: Option<PathBuf>,
    marker: String,
}

impl ExecutableLauncher {
    pub fn new(program: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        let program = program.into();
        let working_dir = program.parent().map(Path::to_path_buf);
        Self {
            program,
            working_dir,
            marker: marker.into(),
        }
    }

    /// Launches the controller's own executable, from its own directory.
    pub fn current_exe(marker: impl Into<String>) -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, marker))
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    fn command(&self, interval_secs: u64) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(&self.marker)
            .arg(interval_secs.to_string())
            .stdin(Stdio::null());

        if let Some(dir) = self.working_dir.as_deref().filter(|dir| dir.is_dir()) {
            command.current_dir(dir);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            command.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        command
    }
}

impl WorkerLauncher for ExecutableLauncher {
    fn launch(&self, interval_secs: u64) -> io::Result<u32> {
        let child = self.command(interval_secs).spawn()?;
        let pid = child.id();
        tracing::info!(pid, program = %self.program.display(), interval_secs, "Worker spawned");
        // Dropping the handle does not kill or wait on the child
        drop(child);
        Ok(pid)
    }

    fn program(&self) -> &Path {
        &self.program
    }
}
