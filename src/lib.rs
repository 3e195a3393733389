//! rollout - remote MSI rollout tool
//!
//! Pushes an installer package to a list of remote Windows machines over
//! their administrative shares, invokes remote execution of the installer,
//! and confirms completion by probing a named remoting endpoint until it
//! answers. Per-host failures accumulate into a CSV report; one host's
//! failure never aborts the run.

pub mod config;
pub mod error;
pub mod hosts;
pub mod poller;
pub mod remote;
pub mod report;
pub mod rollout;

// Re-exports for convenience
pub use config::{Config, ConfigWarning};
pub use error::{RolloutError, RolloutResult};
pub use hosts::load_hosts;
pub use poller::{poll_until_ready, PollOutcome, PollPolicy};
pub use remote::{AdminShare, InstallCommand, PowerShellRemoting, RemoteError};
pub use report::{write_report, FailureRecord};
pub use rollout::{Rollout, RolloutEvent, RolloutEventSink, RolloutOptions, RunSummary, SkipStrategy};
