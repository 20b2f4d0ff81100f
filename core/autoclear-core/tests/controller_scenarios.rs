use autoclear_core::{
    AutoclearError, Controller, ControllerConfig, IntervalChoice, ProcessEntry, ProcessScanner,
    ProcessSignaller, ScriptedPrompt, SignalOutcome, TerminationOutcome, WorkerLauncher,
};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ─────────────────────────────────────────────────────────────────────────────
// Fake host
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct FakeProcess {
    entry: Option<ProcessEntry>,
    ignores_term: bool,
    unkillable: bool,
    foreign: bool,
}

#[derive(Default)]
struct FakeState {
    processes: BTreeMap<u32, FakeProcess>,
    next_pid: u32,
    spawn_fails: bool,
    launched: Vec<u64>,
    signals: Vec<(u32, &'static str)>,
}

/// Synthetic process table implementing every host capability.
#[derive(Default)]
struct FakeHost {
    state: Mutex<FakeState>,
}

impl FakeHost {
    fn new() -> Arc<Self> {
        let host = Self::default();
        host.state.lock().unwrap().next_pid = 1000;
        Arc::new(host)
    }

    fn add_worker(&self, pid: u32) {
        self.add(
            pid,
            FakeProcess {
                entry: Some(worker_entry(pid, "autoclear", 600)),
                ..FakeProcess::default()
            },
        );
    }

    fn add(&self, pid: u32, mut process: FakeProcess) {
        if process.entry.is_none() {
            process.entry = Some(ProcessEntry::new(pid, "bash", &["bash"]));
        }
        self.state.lock().unwrap().processes.insert(pid, process);
    }

    fn update(&self, pid: u32, change: impl FnOnce(&mut FakeProcess)) {
        let mut state = self.state.lock().unwrap();
        change(state.processes.get_mut(&pid).expect("known pid"));
    }

    fn exit(&self, pid: u32) {
        self.state.lock().unwrap().processes.remove(&pid);
    }

    fn is_running(&self, pid: u32) -> bool {
        self.state.lock().unwrap().processes.contains_key(&pid)
    }

    fn fail_spawns(&self) {
        self.state.lock().unwrap().spawn_fails = true;
    }

    fn launched(&self) -> Vec<u64> {
        self.state.lock().unwrap().launched.clone()
    }

    fn signals(&self) -> Vec<(u32, &'static str)> {
        self.state.lock().unwrap().signals.clone()
    }
}

fn worker_entry(pid: u32, name: &str, secs: u64) -> ProcessEntry {
    let secs = secs.to_string();
    ProcessEntry::new(pid, name, &[name, "worker", secs.as_str()])
}

impl ProcessScanner for FakeHost {
    fn snapshot(&self) -> Vec<ProcessEntry> {
        self.state
            .lock()
            .unwrap()
            .processes
            .values()
            .filter_map(|process| process.entry.clone())
            .collect()
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.is_running(pid)
    }
}

impl ProcessSignaller for FakeHost {
    fn terminate(&self, pid: u32) -> SignalOutcome {
        let mut state = self.state.lock().unwrap();
        let Some(process) = state.processes.get(&pid).cloned() else {
            return SignalOutcome::NoSuchProcess;
        };
        if process.foreign {
            return SignalOutcome::PermissionDenied;
        }
        state.signals.push((pid, "TERM"));
        if !process.ignores_term {
            state.processes.remove(&pid);
        }
        SignalOutcome::Delivered
    }

    fn force_kill(&self, pid: u32) -> SignalOutcome {
        let mut state = self.state.lock().unwrap();
        let Some(process) = state.processes.get(&pid).cloned() else {
            return SignalOutcome::NoSuchProcess;
        };
        state.signals.push((pid, "KILL"));
        if !process.unkillable {
            state.processes.remove(&pid);
        }
        SignalOutcome::Delivered
    }
}

impl WorkerLauncher for FakeHost {
    fn launch(&self, interval_secs: u64) -> io::Result<u32> {
        let mut state = self.state.lock().unwrap();
        if state.spawn_fails {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "exec denied"));
        }
        let pid = state.next_pid;
        state.next_pid += 1;
        state.launched.push(interval_secs);
        state.processes.insert(
            pid,
            FakeProcess {
                entry: Some(worker_entry(pid, "autoclear", interval_secs)),
                ..FakeProcess::default()
            },
        );
        Ok(pid)
    }

    fn program(&self) -> &Path {
        Path::new("/fake/autoclear")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

struct Fixture {
    _temp: TempDir,
    pid_file: PathBuf,
    host: Arc<FakeHost>,
    controller: Controller,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let pid_file = temp.path().join("autoclear.pid");
    let config = ControllerConfig {
        stop_timeout_ms: 20,
        kill_timeout_ms: 20,
        poll_interval_ms: 1,
        ..ControllerConfig::with_pid_file(&pid_file)
    };
    let host = FakeHost::new();
    let controller = Controller::with_parts(config, host.clone(), host.clone(), host.clone());
    Fixture {
        _temp: temp,
        pid_file,
        host,
        controller,
    }
}

fn no_prompt() -> ScriptedPrompt {
    ScriptedPrompt::default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_a_nothing_recorded_nothing_running() {
    let fx = fixture();

    let status = fx.controller.status();
    assert!(!status.is_running);
    assert!(status.pids.is_empty());
    assert_eq!(status.main_pid, None);

    let err = fx.controller.stop().unwrap_err();
    assert!(matches!(err, AutoclearError::NotRunning));
    assert_eq!(err.exit_code(), 1);
    assert!(!fx.pid_file.exists());
}

#[test]
fn scenario_b_start_spawns_and_records() {
    let fx = fixture();

    let report = fx.controller.start("10", &mut no_prompt()).unwrap();
    assert_eq!(
        report.interval,
        IntervalChoice::Requested(Duration::from_secs(600))
    );
    assert_eq!(fx.host.launched(), vec![600]);
    assert_eq!(fs_read(&fx.pid_file), report.pid.to_string());

    let status = fx.controller.status();
    assert!(status.is_running);
    assert_eq!(status.pids, vec![report.pid]);
    assert_eq!(status.main_pid, Some(report.pid));
}

#[test]
fn scenario_c_stale_record_without_worker() {
    let fx = fixture();
    std::fs::write(&fx.pid_file, "424242").unwrap();

    let status = fx.controller.status();
    assert_eq!(status.main_pid, None);
    assert!(!status.is_running);
    // status never mutates the record
    assert!(fx.pid_file.exists());

    let err = fx.controller.stop().unwrap_err();
    assert!(matches!(err, AutoclearError::NotRunning));
    assert!(!fx.pid_file.exists());
}

#[test]
fn scenario_d_invalid_interval_falls_back_to_default() {
    let fx = fixture();
    let mut prompt = ScriptedPrompt::new(["0", "-3"]);

    let report = fx.controller.start("0", &mut prompt).unwrap();
    assert_eq!(
        report.interval,
        IntervalChoice::Fallback(Duration::from_secs(600))
    );
    assert_eq!(prompt.asked().len(), 2);
    assert_eq!(fx.host.launched(), vec![600]);
    assert_eq!(fx.controller.status().main_pid, Some(report.pid));
}

#[test]
fn scenario_e_worker_ignoring_term_is_force_killed() {
    let fx = fixture();
    let report = fx.controller.start("1", &mut no_prompt()).unwrap();
    fx.host.update(report.pid, |process| process.ignores_term = true);

    let stop = fx.controller.stop().unwrap();
    assert_eq!(
        stop.outcomes,
        vec![(report.pid, TerminationOutcome::ForceKilled)]
    );
    assert_eq!(
        fx.host.signals(),
        vec![(report.pid, "TERM"), (report.pid, "KILL")]
    );
    assert!(!fx.host.is_running(report.pid));
    assert!(!fx.pid_file.exists());
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn second_start_is_refused_while_running() {
    let fx = fixture();
    let first = fx.controller.start("10", &mut no_prompt()).unwrap();

    for _ in 0..3 {
        let err = fx.controller.start("10", &mut no_prompt()).unwrap_err();
        match err {
            AutoclearError::AlreadyRunning { main_pid } => assert_eq!(main_pid, Some(first.pid)),
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(fx.host.launched().len(), 1);
    assert_eq!(fx.controller.record().read(), Some(first.pid));
}

#[test]
fn start_is_allowed_again_after_worker_dies() {
    let fx = fixture();
    let first = fx.controller.start("10", &mut no_prompt()).unwrap();
    fx.host.exit(first.pid);

    let second = fx.controller.start("5", &mut no_prompt()).unwrap();
    assert_ne!(first.pid, second.pid);
    assert_eq!(fx.controller.record().read(), Some(second.pid));
    assert_eq!(fx.host.launched(), vec![600, 300]);
}

#[test]
fn stop_twice_reports_not_running_the_second_time() {
    let fx = fixture();
    let started = fx.controller.start("10", &mut no_prompt()).unwrap();

    let first = fx.controller.stop().unwrap();
    assert_eq!(first.outcomes, vec![(started.pid, TerminationOutcome::Terminated)]);
    assert_eq!(first.stopped_count(), 1);

    let err = fx.controller.stop().unwrap_err();
    assert!(matches!(err, AutoclearError::NotRunning));
    assert!(!fx.pid_file.exists());
}

#[test]
fn record_is_removed_even_when_stop_fails() {
    let fx = fixture();
    let started = fx.controller.start("10", &mut no_prompt()).unwrap();
    fx.host.update(started.pid, |process| {
        process.ignores_term = true;
        process.unkillable = true;
    });

    let err = fx.controller.stop().unwrap_err();
    assert!(matches!(err, AutoclearError::StopFailed { targets: 1 }));
    assert!(!fx.pid_file.exists());
    assert!(fx.host.is_running(started.pid));
}

#[test]
fn controller_never_lists_itself() {
    let fx = fixture();
    let me = std::process::id();
    fx.host.add_worker(me);
    fx.host.add_worker(77);

    let status = fx.controller.status();
    assert_eq!(status.pids, vec![77]);

    let stop = fx.controller.stop().unwrap();
    assert_eq!(stop.outcomes, vec![(77, TerminationOutcome::Terminated)]);
    assert!(fx.host.is_running(me));
}

#[test]
fn only_self_looking_like_a_worker_is_not_running() {
    let fx = fixture();
    fx.host.add_worker(std::process::id());

    assert!(!fx.controller.status().is_running);
    assert!(matches!(
        fx.controller.stop(),
        Err(AutoclearError::NotRunning)
    ));
}

#[test]
fn record_reused_by_controller_pid_is_never_signalled() {
    let fx = fixture();
    let me = std::process::id();
    fx.host.add(me, FakeProcess::default());
    std::fs::write(&fx.pid_file, me.to_string()).unwrap();

    assert_eq!(fx.controller.status().main_pid, None);
    assert!(matches!(
        fx.controller.stop(),
        Err(AutoclearError::NotRunning)
    ));
    assert!(fx.host.signals().is_empty());
    assert!(fx.host.is_running(me));
    assert!(!fx.pid_file.exists());
}

#[test]
fn record_reused_by_controller_pid_is_skipped_alongside_workers() {
    let fx = fixture();
    let me = std::process::id();
    fx.host.add(me, FakeProcess::default());
    fx.host.add_worker(88);
    std::fs::write(&fx.pid_file, me.to_string()).unwrap();

    let stop = fx.controller.stop().unwrap();
    assert_eq!(stop.outcomes, vec![(88, TerminationOutcome::Terminated)]);
    assert_eq!(fx.host.signals(), vec![(88, "TERM")]);
    assert!(!fx.pid_file.exists());
}

#[test]
fn spawn_failure_writes_no_record() {
    let fx = fixture();
    std::fs::write(&fx.pid_file, "31337").unwrap();
    fx.host.fail_spawns();

    let err = fx.controller.start("10", &mut no_prompt()).unwrap_err();
    match err {
        AutoclearError::SpawnFailed { program, .. } => {
            assert_eq!(program, PathBuf::from("/fake/autoclear"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!fx.pid_file.exists());
}

#[test]
fn cancelled_start_spawns_nothing() {
    let fx = fixture();
    let mut prompt = ScriptedPrompt::new(["q"]);

    let err = fx.controller.start("ten", &mut prompt).unwrap_err();
    assert!(matches!(err, AutoclearError::Cancelled));
    assert!(fx.host.launched().is_empty());
    assert!(!fx.pid_file.exists());
}

#[test]
fn start_replaces_stale_record() {
    let fx = fixture();
    std::fs::write(&fx.pid_file, "5").unwrap();

    let report = fx.controller.start("2", &mut no_prompt()).unwrap();
    assert_eq!(fs_read(&fx.pid_file), report.pid.to_string());
}

#[test]
fn workers_without_record_are_found_and_stopped() {
    let fx = fixture();
    fx.host.add_worker(301);
    fx.host.add_worker(302);

    let status = fx.controller.status();
    assert!(status.is_running);
    assert_eq!(status.pids, vec![301, 302]);
    assert_eq!(status.main_pid, None);

    let stop = fx.controller.stop().unwrap();
    assert_eq!(stop.stopped_count(), 2);
    assert!(!fx.host.is_running(301));
    assert!(!fx.host.is_running(302));
}

#[test]
fn stop_targets_union_of_record_and_scan() {
    let fx = fixture();
    // Recorded worker whose executable was renamed; the scan no longer sees it
    fx.host.add(
        410,
        FakeProcess {
            entry: Some(worker_entry(410, "ac-old", 600)),
            ..FakeProcess::default()
        },
    );
    fx.host.add_worker(411);
    std::fs::write(&fx.pid_file, "410").unwrap();

    let status = fx.controller.status();
    assert_eq!(status.pids, vec![411]);
    assert_eq!(status.main_pid, Some(410));

    let stop = fx.controller.stop().unwrap();
    assert_eq!(
        stop.outcomes,
        vec![
            (410, TerminationOutcome::Terminated),
            (411, TerminationOutcome::Terminated),
        ]
    );
}

#[test]
fn recorded_live_pid_alone_is_stoppable() {
    let fx = fixture();
    fx.host.add(
        520,
        FakeProcess {
            entry: Some(worker_entry(520, "renamed", 60)),
            ..FakeProcess::default()
        },
    );
    std::fs::write(&fx.pid_file, "520").unwrap();

    assert!(!fx.controller.status().is_running);
    let stop = fx.controller.stop().unwrap();
    assert_eq!(stop.outcomes, vec![(520, TerminationOutcome::Terminated)]);
}

#[test]
fn stale_record_is_skipped_while_live_worker_is_stopped() {
    let fx = fixture();
    fx.host.add_worker(600);
    std::fs::write(&fx.pid_file, "599").unwrap();

    let stop = fx.controller.stop().unwrap();
    assert_eq!(
        stop.outcomes,
        vec![
            (599, TerminationOutcome::Vanished),
            (600, TerminationOutcome::Terminated),
        ]
    );
    assert!(!fx.pid_file.exists());
}

#[test]
fn foreign_worker_is_skipped_without_failing_others() {
    let fx = fixture();
    fx.host.add(
        700,
        FakeProcess {
            entry: Some(worker_entry(700, "autoclear", 60)),
            foreign: true,
            ..FakeProcess::default()
        },
    );
    fx.host.add_worker(701);

    let stop = fx.controller.stop().unwrap();
    assert_eq!(
        stop.outcomes,
        vec![
            (700, TerminationOutcome::Denied),
            (701, TerminationOutcome::Terminated),
        ]
    );
    assert!(fx.host.is_running(700));
}

#[test]
fn only_foreign_workers_means_stop_failed() {
    let fx = fixture();
    fx.host.add(
        800,
        FakeProcess {
            entry: Some(worker_entry(800, "autoclear", 60)),
            foreign: true,
            ..FakeProcess::default()
        },
    );

    let err = fx.controller.stop().unwrap_err();
    assert!(matches!(err, AutoclearError::StopFailed { targets: 1 }));
}

fn fs_read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
