//! Live worker discovery over the host process table.

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, System, UpdateKind};

use super::{ProcessEntry, ProcessScanner, ProcessSignaller, SignalOutcome};
use crate::config::WorkerSignature;

/// Returns the pids of worker instances in `entries`, ascending and deduped.
///
/// A process is a worker iff its name contains the signature's executable
/// family, one of its arguments equals the marker, and it is not `self_pid`.
pub fn classify_workers(
    entries: &[ProcessEntry],
    signature: &WorkerSignature,
    self_pid: u32,
) -> Vec<u32> {
    let mut pids: Vec<u32> = entries
        .iter()
        .filter(|entry| entry.pid != self_pid && is_worker(entry, signature))
        .map(|entry| entry.pid)
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

pub fn is_worker(entry: &ProcessEntry, signature: &WorkerSignature) -> bool {
    let family = signature.executable.to_lowercase();
    if !entry.name.to_lowercase().contains(&family) {
        return false;
    }

    // argv[0] is the program itself; only real arguments can carry the marker
    entry
        .cmd
        .iter()
        .skip(1)
        .any(|arg| arg.eq_ignore_ascii_case(&signature.marker))
}

/// The real host: `sysinfo` for enumeration, `libc::kill` for liveness and
/// signalling on unix.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl SystemProcesses {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessScanner for SystemProcesses {
    fn snapshot(&self) -> Vec<ProcessEntry> {
        let mut sys = System::new();
        sys.refresh_processes_specifics(ProcessRefreshKind::new().with_cmd(UpdateKind::Always));

        sys.processes()
            .iter()
            .filter(|(_, process)| process.status() != ProcessStatus::Zombie)
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string(),
                cmd: process.cmd().to_vec(),
            })
            .collect()
    }

    fn is_alive(&self, pid: u32) -> bool {
        if pid == 0 || !pid_exists(pid) {
            return false;
        }

        // kill(pid, 0) succeeds for zombies; they have exited for our purposes
        let mut sys = System::new();
        let sys_pid = Pid::from_u32(pid);
        sys.refresh_process_specifics(sys_pid, ProcessRefreshKind::new());
        !sys
            .process(sys_pid)
            .is_some_and(|process| process.status() == ProcessStatus::Zombie)
    }
}

impl ProcessSignaller for SystemProcesses {
    fn terminate(&self, pid: u32) -> SignalOutcome {
        #[cfg(unix)]
        {
            super::signal::send_signal(pid, libc::SIGTERM)
        }
        #[cfg(not(unix))]
        {
            super::signal::sysinfo_kill(pid, Some(sysinfo::Signal::Term))
        }
    }

    fn force_kill(&self, pid: u32) -> SignalOutcome {
        #[cfg(unix)]
        {
            super::signal::send_signal(pid, libc::SIGKILL)
        }
        #[cfg(not(unix))]
        {
            super::signal::sysinfo_kill(pid, None)
        }
    }
}

#[cfg(unix)]
fn pid_exists(pid: u32) -> bool {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };

    // SAFETY: signal 0 only performs existence and permission checks.
    #[allow(unsafe_code)]
    let rc = unsafe { libc::kill(raw, 0) };
    if rc == 0 {
        return true;
    }
    // EPERM: the process exists but belongs to someone else
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn pid_exists(pid: u32) -> bool {
    let mut sys = System::new();
    sys.refresh_process_specifics(Pid::from_u32(pid), ProcessRefreshKind::new())
}
