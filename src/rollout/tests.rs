//! Orchestrator tests
//!
//! Exercise the per-host pipeline against recording fakes of the three
//! remote seams.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::poller::PollPolicy;
use crate::remote::{CommandDispatch, InstallCommand, RemoteError, RemoteShare, SessionProbe};
use crate::rollout::{Rollout, RolloutEvent, RolloutEventSink, RolloutOptions, SkipStrategy};

fn key(host: &str, path: &str) -> String {
    format!("{}|{}", host, path)
}

/// Share fake backed by a set of existing remote paths
#[derive(Default, Clone)]
struct MockShare {
    existing: Arc<Mutex<HashSet<String>>>,
    copies: Arc<Mutex<Vec<(String, String)>>>,
    writes: Arc<Mutex<Vec<(String, String, String)>>>,
    fail_copy: Arc<Mutex<HashSet<String>>>,
    fail_write: Arc<Mutex<HashSet<String>>>,
}

impl MockShare {
    fn with_existing(self, host: &str, path: &str) -> Self {
        self.existing.lock().unwrap().insert(key(host, path));
        self
    }

    fn failing_copy(self, host: &str) -> Self {
        self.fail_copy.lock().unwrap().insert(host.to_string());
        self
    }

    fn failing_write(self, host: &str) -> Self {
        self.fail_write.lock().unwrap().insert(host.to_string());
        self
    }

    fn copy_count(&self) -> usize {
        self.copies.lock().unwrap().len()
    }
}

impl RemoteShare for MockShare {
    fn exists(&self, host: &str, remote_path: &str) -> bool {
        self.existing.lock().unwrap().contains(&key(host, remote_path))
    }

    fn copy_in(
        &self,
        host: &str,
        _local: &std::path::Path,
        remote_path: &str,
    ) -> Result<(), RemoteError> {
        if self.fail_copy.lock().unwrap().contains(host) {
            return Err(RemoteError::Copy {
                host: host.to_string(),
                message: "access denied".to_string(),
            });
        }
        self.copies
            .lock()
            .unwrap()
            .push((host.to_string(), remote_path.to_string()));
        self.existing.lock().unwrap().insert(key(host, remote_path));
        Ok(())
    }

    fn write_text(&self, host: &str, remote_path: &str, content: &str) -> Result<(), RemoteError> {
        if self.fail_write.lock().unwrap().contains(host) {
            return Err(RemoteError::Write {
                host: host.to_string(),
                message: "share gone".to_string(),
            });
        }
        self.writes.lock().unwrap().push((
            host.to_string(),
            remote_path.to_string(),
            content.to_string(),
        ));
        self.existing.lock().unwrap().insert(key(host, remote_path));
        Ok(())
    }
}

/// Dispatch fake recording every invocation
#[derive(Default, Clone)]
struct MockDispatch {
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockDispatch {
    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CommandDispatch for MockDispatch {
    fn dispatch(&self, host: &str, command: &InstallCommand) {
        self.calls
            .lock()
            .unwrap()
            .push((host.to_string(), command.argument_line()));
    }
}

/// Probe fake: per host, how many attempts fail before the endpoint answers.
/// Hosts without an entry never answer.
#[derive(Default, Clone)]
struct MockProbe {
    ready_after: Arc<Mutex<HashMap<String, u32>>>,
    attempts: Arc<Mutex<HashMap<String, u32>>>,
}

impl MockProbe {
    fn ready_after(self, host: &str, failures: u32) -> Self {
        self.ready_after
            .lock()
            .unwrap()
            .insert(host.to_string(), failures);
        self
    }

    fn attempts_for(&self, host: &str) -> u32 {
        self.attempts.lock().unwrap().get(host).copied().unwrap_or(0)
    }
}

impl SessionProbe for MockProbe {
    fn open(&self, host: &str, _endpoint: &str) -> Result<(), RemoteError> {
        let mut attempts = self.attempts.lock().unwrap();
        let count = attempts.entry(host.to_string()).or_insert(0);
        *count += 1;

        match self.ready_after.lock().unwrap().get(host) {
            Some(failures) if *count > *failures => Ok(()),
            _ => Err(RemoteError::Connection {
                host: host.to_string(),
                message: "endpoint not answering".to_string(),
            }),
        }
    }
}

/// Sink recording every event
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<RolloutEvent>>,
}

impl RolloutEventSink for RecordingSink {
    fn on_event(&self, event: RolloutEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn options() -> RolloutOptions {
    RolloutOptions::new(r"pwsh.msi")
        .with_destination(r"C:\Temp")
        .with_endpoint("PowerShell.7")
        .with_precheck(PollPolicy::new(1, Duration::ZERO))
        .with_confirm(PollPolicy::new(15, Duration::ZERO))
}

#[test]
fn scenario_a_answering_host_is_skipped_entirely() {
    let share = MockShare::default();
    let dispatch = MockDispatch::default();
    let probe = MockProbe::default().ready_after("alpha", 0);
    let rollout = Rollout::new(share.clone(), dispatch.clone(), probe.clone());

    let summary = rollout.execute(&hosts(&["alpha", "beta"]), &options());

    // alpha answered the precheck: nothing staged, nothing dispatched, no
    // failure record for it
    assert_eq!(summary.skipped, vec!["alpha"]);
    assert_eq!(probe.attempts_for("alpha"), 1);
    assert!(share
        .copies
        .lock()
        .unwrap()
        .iter()
        .all(|(host, _)| host != "alpha"));
    assert!(summary.failures.iter().all(|f| f.host != "alpha"));

    // beta never answered and fails after the confirmation budget
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].host, "beta");
}

#[test]
fn scenario_b_staging_failure_skips_install() {
    let share = MockShare::default().failing_copy("gamma");
    let dispatch = MockDispatch::default();
    let probe = MockProbe::default();
    let rollout = Rollout::new(share, dispatch.clone(), probe);

    let summary = rollout.execute(&hosts(&["gamma"]), &options());

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].host, "gamma");
    assert!(summary.failures[0].error.contains("copy to gamma failed"));
    assert_eq!(dispatch.call_count(), 0);
}

#[test]
fn scenario_c_exhausted_confirmation_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("failed-installs.csv");

    let share = MockShare::default();
    let dispatch = MockDispatch::default();
    let probe = MockProbe::default();
    let rollout = Rollout::new(share, dispatch.clone(), probe.clone());

    let summary = rollout.execute(
        &hosts(&["delta"]),
        &options().with_report(Some(report.clone())),
    );

    assert_eq!(dispatch.call_count(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].error.contains("after 15 attempts"));
    // 1 precheck attempt + 15 confirmation attempts
    assert_eq!(probe.attempts_for("delta"), 16);

    let content = std::fs::read_to_string(&report).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.contains("delta"));
}

#[test]
fn scenario_d_no_failures_no_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("failed-installs.csv");

    let probe = MockProbe::default().ready_after("alpha", 0);
    let rollout = Rollout::new(MockShare::default(), MockDispatch::default(), probe);

    let summary = rollout.execute(&hosts(&["alpha"]), &options().with_report(Some(report.clone())));

    assert!(summary.is_success());
    assert!(!report.exists());
}

#[test]
fn staged_artifact_is_not_copied_again() {
    let artifact = key("epsilon", r"C:\Temp\pwsh.msi");
    let share = MockShare::default();
    share.existing.lock().unwrap().insert(artifact);
    let dispatch = MockDispatch::default();
    // epsilon starts answering on the second probe attempt (after install)
    let probe = MockProbe::default().ready_after("epsilon", 1);
    let rollout = Rollout::new(share.clone(), dispatch.clone(), probe);

    let summary = rollout.execute(
        &hosts(&["epsilon"]),
        &options().with_strategy(SkipStrategy::Marker),
    );

    assert_eq!(share.copy_count(), 0);
    assert_eq!(dispatch.call_count(), 1);
    assert_eq!(summary.installed, vec!["epsilon"]);
}

#[test]
fn marker_present_skips_installation() {
    let share = MockShare::default()
        .with_existing("zeta", r"C:\Temp\pwsh.msi")
        .with_existing("zeta", r"C:\Temp\rollout.done");
    let dispatch = MockDispatch::default();
    let rollout = Rollout::new(share, dispatch.clone(), MockProbe::default());

    let summary = rollout.execute(
        &hosts(&["zeta"]),
        &options().with_strategy(SkipStrategy::Marker),
    );

    assert_eq!(summary.skipped, vec!["zeta"]);
    assert_eq!(dispatch.call_count(), 0);
    assert!(summary.is_success());
}

#[test]
fn marker_written_after_confirmed_install() {
    let share = MockShare::default();
    let probe = MockProbe::default().ready_after("eta", 0);
    let rollout = Rollout::new(share.clone(), MockDispatch::default(), probe);

    let summary = rollout.execute(
        &hosts(&["eta"]),
        &options().with_strategy(SkipStrategy::Marker),
    );

    assert_eq!(summary.installed, vec!["eta"]);
    let writes = share.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].1, r"C:\Temp\rollout.done");
    assert!(writes[0].2.starts_with("installed "));
}

#[test]
fn marker_write_failure_is_a_warning_not_a_failure() {
    let share = MockShare::default().failing_write("theta");
    let probe = MockProbe::default().ready_after("theta", 0);
    let rollout = Rollout::new(share, MockDispatch::default(), probe);

    let summary = rollout.execute(
        &hosts(&["theta"]),
        &options().with_strategy(SkipStrategy::Marker),
    );

    assert_eq!(summary.installed, vec!["theta"]);
    assert!(summary.is_success());
    assert_eq!(summary.warnings.len(), 1);
    assert!(summary.warnings[0].contains("marker not written"));
}

#[test]
fn one_failed_host_does_not_abort_the_run() {
    let share = MockShare::default().failing_copy("a-fails");
    let dispatch = MockDispatch::default();
    let probe = MockProbe::default()
        .ready_after("b-current", 0)
        .ready_after("c-installs", 1);
    let rollout = Rollout::new(share, dispatch, probe);

    let summary = rollout.execute(&hosts(&["a-fails", "b-current", "c-installs"]), &options());

    assert_eq!(summary.host_count, 3);
    assert_eq!(summary.installed, vec!["c-installs"]);
    assert_eq!(summary.skipped, vec!["b-current"]);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].host, "a-fails");
}

#[test]
fn dry_run_touches_no_target() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("failed-installs.csv");

    let share = MockShare::default();
    let dispatch = MockDispatch::default();
    let probe = MockProbe::default();
    let rollout = Rollout::new(share.clone(), dispatch.clone(), probe.clone());
    let sink = Arc::new(RecordingSink::default());

    let summary = rollout.execute_with_events(
        &hosts(&["web01"]),
        &options().with_dry_run(true).with_report(Some(report.clone())),
        sink.clone(),
    );

    assert_eq!(share.copy_count(), 0);
    assert_eq!(dispatch.call_count(), 0);
    assert_eq!(probe.attempts_for("web01"), 0);
    assert!(!report.exists());
    assert_eq!(summary.skipped, vec!["web01"]);

    let events = sink.events.lock().unwrap();
    let planned = events
        .iter()
        .find_map(|e| match e {
            RolloutEvent::HostPlanned { share_path, .. } => Some(share_path.clone()),
            _ => None,
        })
        .expect("dry run emits a plan event");
    assert_eq!(planned, r"\\web01\C$\Temp\pwsh.msi");
}

#[test]
fn report_location_is_optional() {
    let rollout = Rollout::new(
        MockShare::default().failing_copy("web01"),
        MockDispatch::default(),
        MockProbe::default(),
    );

    // No report path configured: failures stay on the summary only
    let summary = rollout.execute(&hosts(&["web01"]), &options().with_report(None));

    assert_eq!(summary.failures.len(), 1);
    assert!(summary.warnings.is_empty());
}

#[test]
fn empty_host_slice_produces_empty_summary() {
    // The loader already rejects an empty list as fatal; an empty slice here
    // must still never claim success over work it did not do.
    let rollout = Rollout::new(
        MockShare::default(),
        MockDispatch::default(),
        MockProbe::default(),
    );

    let summary = rollout.execute(&[], &options());

    assert_eq!(summary.host_count, 0);
    assert!(summary.installed.is_empty());
    assert!(summary.skipped.is_empty());
    assert!(summary.is_success());
}

#[test]
fn install_command_carries_destination_and_features() {
    let share = MockShare::default();
    let dispatch = MockDispatch::default();
    let probe = MockProbe::default().ready_after("iota", 1);
    let rollout = Rollout::new(share, dispatch.clone(), probe);

    let opts = options().with_features(vec![
        "ENABLE_PSREMOTING=1".to_string(),
        "ADD_PATH=1".to_string(),
    ]);
    rollout.execute(&hosts(&["iota"]), &opts);

    let calls = dispatch.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "iota");
    assert_eq!(
        calls[0].1,
        r#"msiexec.exe /i "C:\Temp\pwsh.msi" /qn ENABLE_PSREMOTING=1 ADD_PATH=1"#
    );
}

#[test]
fn failure_records_are_in_processing_order() {
    let share = MockShare::default()
        .failing_copy("a")
        .failing_copy("b");
    let rollout = Rollout::new(share, MockDispatch::default(), MockProbe::default());

    let summary = rollout.execute(&hosts(&["a", "b"]), &options());

    let failed: Vec<&str> = summary.failures.iter().map(|f| f.host.as_str()).collect();
    assert_eq!(failed, vec!["a", "b"]);
}

#[test]
fn report_path_buf_round_trip() {
    // Guard against the report being written relative to the wrong directory
    let dir = tempfile::tempdir().unwrap();
    let report: PathBuf = dir.path().join("nested").join("report.csv");
    std::fs::create_dir_all(report.parent().unwrap()).unwrap();

    let rollout = Rollout::new(
        MockShare::default().failing_copy("web01"),
        MockDispatch::default(),
        MockProbe::default(),
    );
    rollout.execute(&hosts(&["web01"]), &options().with_report(Some(report.clone())));

    assert!(report.exists());
}
