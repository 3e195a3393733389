//! Rollout orchestrator
//!
//! Drives the per-host pipeline: precheck probe or marker check, staging over
//! the administrative share, install dispatch, and the confirmation poll.
//! Hosts are processed strictly sequentially; each remote operation blocks
//! until it completes or exhausts its retry budget.

use std::sync::Arc;

use crate::poller::poll_until_ready;
use crate::remote::{
    admin_share_path, join_remote, CommandDispatch, InstallCommand, RemoteShare, SessionProbe,
};
use crate::report::{write_report, FailureRecord};

use super::events::{NoopEventSink, RolloutEvent, RolloutEventSink};
use super::options::{RolloutOptions, SkipStrategy};
use super::result::RunSummary;

/// What happened to one host
enum HostOutcome {
    Installed { attempts: u32, warning: Option<String> },
    Skipped { reason: String },
    Failed { error: String },
}

/// Rollout orchestrator, parameterized by its remote seams
///
/// The three type parameters mirror the three remote capabilities: file
/// staging, command dispatch, and the session probe. Tests substitute
/// recording fakes per seam.
pub struct Rollout<S, D, P>
where
    S: RemoteShare,
    D: CommandDispatch,
    P: SessionProbe,
{
    share: S,
    dispatch: D,
    probe: P,
}

impl<S, D, P> Rollout<S, D, P>
where
    S: RemoteShare,
    D: CommandDispatch,
    P: SessionProbe,
{
    pub fn new(share: S, dispatch: D, probe: P) -> Self {
        Self {
            share,
            dispatch,
            probe,
        }
    }

    /// Execute the rollout silently
    pub fn execute(&self, hosts: &[String], options: &RolloutOptions) -> RunSummary {
        self.execute_with_events(hosts, options, Arc::new(NoopEventSink))
    }

    /// Execute the rollout with event reporting
    pub fn execute_with_events(
        &self,
        hosts: &[String],
        options: &RolloutOptions,
        event_sink: Arc<dyn RolloutEventSink>,
    ) -> RunSummary {
        let mut summary = RunSummary::new(hosts.len());

        event_sink.on_event(RolloutEvent::Started {
            host_count: hosts.len(),
        });

        for (index, host) in hosts.iter().enumerate() {
            event_sink.on_event(RolloutEvent::HostStarted {
                index,
                host: host.clone(),
            });

            if options.dry_run {
                self.plan_host(host, options, &event_sink);
                summary.skipped.push(host.clone());
                continue;
            }

            match self.process_host(index, host, options, &event_sink) {
                HostOutcome::Installed { attempts, warning } => {
                    if let Some(warning) = warning {
                        summary.add_warning(warning);
                    }
                    summary.installed.push(host.clone());
                    event_sink.on_event(RolloutEvent::HostInstalled {
                        index,
                        host: host.clone(),
                        attempts,
                    });
                }
                HostOutcome::Skipped { reason } => {
                    summary.skipped.push(host.clone());
                    event_sink.on_event(RolloutEvent::HostSkipped {
                        index,
                        host: host.clone(),
                        reason,
                    });
                }
                HostOutcome::Failed { error } => {
                    summary.failures.push(FailureRecord::new(host, &error));
                    event_sink.on_event(RolloutEvent::HostFailed {
                        index,
                        host: host.clone(),
                        error,
                    });
                }
            }
        }

        self.flush_report(options, &mut summary, &event_sink);

        event_sink.on_event(RolloutEvent::Completed {
            installed: summary.installed.len(),
            skipped: summary.skipped.len(),
            failed: summary.failures.len(),
        });

        summary
    }

    /// Dry run: announce what would happen on this host
    fn plan_host(
        &self,
        host: &str,
        options: &RolloutOptions,
        event_sink: &Arc<dyn RolloutEventSink>,
    ) {
        let remote_artifact = join_remote(&options.destination, &options.artifact_name());
        event_sink.on_event(RolloutEvent::HostPlanned {
            host: host.to_string(),
            share_path: admin_share_path(host, &remote_artifact)
                .display()
                .to_string(),
            command: self.install_command(options, &remote_artifact).to_string(),
        });
    }

    /// Run the full pipeline for one host
    fn process_host(
        &self,
        index: usize,
        host: &str,
        options: &RolloutOptions,
        event_sink: &Arc<dyn RolloutEventSink>,
    ) -> HostOutcome {
        let remote_artifact = join_remote(&options.destination, &options.artifact_name());

        // Fast path: if the endpoint already answers, the host is done -
        // skip it entirely, staging included.
        if options.strategy == SkipStrategy::Probe {
            let precheck = poll_until_ready(&self.probe, host, &options.endpoint, &options.precheck);
            if precheck.ready {
                return HostOutcome::Skipped {
                    reason: format!("already answering on {}", options.endpoint),
                };
            }
        }

        let copied = if self.share.exists(host, &remote_artifact) {
            false
        } else if let Err(e) = self.share.copy_in(host, &options.artifact, &remote_artifact) {
            return HostOutcome::Failed {
                error: e.to_string(),
            };
        } else {
            true
        };
        event_sink.on_event(RolloutEvent::Staged {
            index,
            host: host.to_string(),
            copied,
        });

        // The marker only gates installation; staging above already repaired
        // a missing artifact on rerun.
        let marker = join_remote(&options.destination, &options.marker_name);
        if options.strategy == SkipStrategy::Marker && self.share.exists(host, &marker) {
            return HostOutcome::Skipped {
                reason: format!("marker {} present", options.marker_name),
            };
        }

        event_sink.on_event(RolloutEvent::Installing {
            index,
            host: host.to_string(),
        });
        let command = self.install_command(options, &remote_artifact);
        self.dispatch.dispatch(host, &command);

        let confirm = poll_until_ready(&self.probe, host, &options.endpoint, &options.confirm);
        if !confirm.ready {
            let detail = confirm
                .last_error
                .unwrap_or_else(|| "no session established".to_string());
            return HostOutcome::Failed {
                error: format!(
                    "endpoint {} did not answer after {} attempts: {}",
                    options.endpoint, confirm.attempts, detail
                ),
            };
        }

        // The install is proven by the probe; a failed marker write must not
        // turn a confirmed success into a failure.
        let mut warning = None;
        if options.strategy == SkipStrategy::Marker {
            let content = format!("installed {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
            if let Err(e) = self.share.write_text(host, &marker, &content) {
                warning = Some(format!("marker not written: {}", e));
            }
        }

        HostOutcome::Installed {
            attempts: confirm.attempts,
            warning,
        }
    }

    fn install_command(&self, options: &RolloutOptions, remote_artifact: &str) -> InstallCommand {
        InstallCommand::msi(remote_artifact)
            .with_quiet(options.quiet)
            .with_features(options.features.clone())
    }

    /// Export the failure report, only when there is something to report
    fn flush_report(
        &self,
        options: &RolloutOptions,
        summary: &mut RunSummary,
        event_sink: &Arc<dyn RolloutEventSink>,
    ) {
        let Some(path) = &options.report else {
            return;
        };
        if summary.failures.is_empty() || options.dry_run {
            return;
        }

        match write_report(path, &summary.failures) {
            Ok(()) => event_sink.on_event(RolloutEvent::ReportWritten {
                path: path.clone(),
                count: summary.failures.len(),
            }),
            Err(e) => summary.add_warning(format!("report not written: {}", e)),
        }
    }
}
