//! Termination signalling and bounded exit waits.

use std::thread;
use std::time::{Duration, Instant};

use super::{ProcessScanner, SignalOutcome};

#[cfg(unix)]
pub(super) fn send_signal(pid: u32, signal: libc::c_int) -> SignalOutcome {
    let raw = match libc::pid_t::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => return SignalOutcome::NoSuchProcess,
    };

    // SAFETY: plain POSIX signal delivery to a single positive pid; the pid
    // may have exited already, which surfaces as ESRCH.
    #[allow(unsafe_code)]
    let rc = unsafe { libc::kill(raw, signal) };
    if rc == 0 {
        return SignalOutcome::Delivered;
    }

    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => SignalOutcome::NoSuchProcess,
        Some(libc::EPERM) => SignalOutcome::PermissionDenied,
        _ => SignalOutcome::Failed(err.to_string()),
    }
}

#[cfg(not(unix))]
pub(super) fn sysinfo_kill(pid: u32, signal: Option<sysinfo::Signal>) -> SignalOutcome {
    use sysinfo::{Pid, ProcessRefreshKind, System};

    let mut sys = System::new();
    let sys_pid = Pid::from_u32(pid);
    sys.refresh_process_specifics(sys_pid, ProcessRefreshKind::new());
    let Some(process) = sys.process(sys_pid) else {
        return SignalOutcome::NoSuchProcess;
    };

    let delivered = match signal {
        // Hosts without a graceful signal fall back to a plain kill
        Some(signal) => process.kill_with(signal).unwrap_or_else(|| process.kill()),
        None => process.kill(),
    };
    if delivered {
        SignalOutcome::Delivered
    } else {
        SignalOutcome::Failed(format!("kill request for PID {} was refused", pid))
    }
}

/// Polls until `pid` is gone or `timeout` elapses. Returns true if it exited.
///
/// A timeout past the clock's range waits until the process is gone.
pub fn wait_for_exit(
    scanner: &dyn ProcessScanner,
    pid: u32,
    timeout: Duration,
    poll: Duration,
) -> bool {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if !scanner.is_alive(pid) {
            return true;
        }
        let now = Instant::now();
        let slice = match deadline {
            Some(deadline) if now >= deadline => return false,
            Some(deadline) => poll.min(deadline - now),
            None => poll,
        };
        thread::sleep(slice);
    }
}
