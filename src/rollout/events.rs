//! Rollout events
//!
//! Observable interface for rollout runs. Enables console progress, NDJSON
//! event streams and silent operation from the same orchestrator.

use std::path::PathBuf;

/// Event emitted during a rollout run
#[derive(Debug, Clone)]
pub enum RolloutEvent {
    /// Run started
    Started { host_count: usize },

    /// A host's pipeline began
    HostStarted { index: usize, host: String },

    /// Dry run: what would happen on this host
    HostPlanned {
        host: String,
        share_path: String,
        command: String,
    },

    /// Host skipped by the idempotency check
    HostSkipped {
        index: usize,
        host: String,
        reason: String,
    },

    /// Artifact present on the host (copied now, or already there)
    Staged {
        index: usize,
        host: String,
        copied: bool,
    },

    /// Install command dispatched
    Installing { index: usize, host: String },

    /// Endpoint answered within the confirmation budget
    HostInstalled {
        index: usize,
        host: String,
        attempts: u32,
    },

    /// Host failed; the run continues
    HostFailed {
        index: usize,
        host: String,
        error: String,
    },

    /// Failure report exported
    ReportWritten { path: PathBuf, count: usize },

    /// Run finished
    Completed {
        installed: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Trait for receiving rollout events
pub trait RolloutEventSink: Send + Sync {
    fn on_event(&self, event: RolloutEvent);
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl RolloutEventSink for NoopEventSink {
    fn on_event(&self, _event: RolloutEvent) {
        // Do nothing
    }
}
