//! Rollout options
//!
//! Configuration types for a rollout run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::poller::PollPolicy;

/// Which idempotency check skips hosts that already carry the install
///
/// The two checks come from the two historical variants of this procedure;
/// one orchestrator with a selectable strategy replaces both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SkipStrategy {
    /// Short-budget endpoint probe before any staging; success skips the
    /// host entirely
    #[default]
    Probe,
    /// Marker file next to the staged artifact, checked after staging and
    /// written on confirmed success
    Marker,
}

/// Options for one rollout run
#[derive(Debug, Clone)]
pub struct RolloutOptions {
    /// Local installer package
    pub artifact: PathBuf,
    /// Staging folder on each target, as the target sees it
    pub destination: String,
    /// Session configuration name to probe
    pub endpoint: String,
    /// MSI properties appended to the install command line
    pub features: Vec<String>,
    /// Suppress installer UI
    pub quiet: bool,
    /// Idempotency strategy
    pub strategy: SkipStrategy,
    /// Marker file name (marker strategy only)
    pub marker_name: String,
    /// Budget for the already-installed precheck
    pub precheck: PollPolicy,
    /// Budget for the post-install confirmation
    pub confirm: PollPolicy,
    /// Failure report location; `None` disables the export
    pub report: Option<PathBuf>,
    /// Print the plan without touching any target
    pub dry_run: bool,
}

impl RolloutOptions {
    pub fn new(artifact: impl Into<PathBuf>) -> Self {
        Self {
            artifact: artifact.into(),
            destination: r"C:\Temp".to_string(),
            endpoint: "PowerShell.7".to_string(),
            features: Vec::new(),
            quiet: true,
            strategy: SkipStrategy::default(),
            marker_name: "rollout.done".to_string(),
            precheck: PollPolicy::precheck(std::time::Duration::from_secs(1)),
            confirm: PollPolicy::default(),
            report: None,
            dry_run: false,
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_strategy(mut self, strategy: SkipStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_marker_name(mut self, name: impl Into<String>) -> Self {
        self.marker_name = name.into();
        self
    }

    pub fn with_precheck(mut self, policy: PollPolicy) -> Self {
        self.precheck = policy;
        self
    }

    pub fn with_confirm(mut self, policy: PollPolicy) -> Self {
        self.confirm = policy;
        self
    }

    pub fn with_report(mut self, report: Option<PathBuf>) -> Self {
        self.report = report;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// File name of the artifact as staged on the target
    pub fn artifact_name(&self) -> String {
        self.artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
