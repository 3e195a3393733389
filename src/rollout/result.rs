//! Rollout run summary

use crate::report::FailureRecord;

/// Result of one rollout run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Hosts confirmed installed during this run
    pub installed: Vec<String>,
    /// Hosts skipped because they already carry the install
    pub skipped: Vec<String>,
    /// Per-host failures, in processing order
    pub failures: Vec<FailureRecord>,
    /// Non-fatal issues (e.g. a marker write that failed after a confirmed
    /// install)
    pub warnings: Vec<String>,
    /// Total hosts the run was asked to process
    pub host_count: usize,
}

impl RunSummary {
    pub fn new(host_count: usize) -> Self {
        Self {
            host_count,
            ..Self::default()
        }
    }

    /// True when no host failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
