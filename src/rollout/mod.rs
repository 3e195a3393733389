//! Deployment orchestration
//!
//! Sequences staging, install dispatch and availability confirmation per
//! host, accumulating failures into the run summary. One host's failure
//! never aborts the run; only pre-flight input errors do, and those are
//! raised before this module is ever entered.

mod events;
mod options;
mod result;
mod run;

#[cfg(test)]
mod tests;

pub use events::{NoopEventSink, RolloutEvent, RolloutEventSink};
pub use options::{RolloutOptions, SkipStrategy};
pub use result::RunSummary;
pub use run::Rollout;
