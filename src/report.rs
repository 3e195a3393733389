//! Failure report
//!
//! Per-host failures accumulate as `FailureRecord`s during the run and are
//! flushed exactly once at the end, as a flat CSV export. The orchestrator
//! only writes the report when there is at least one record.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::RolloutResult;

/// One failed target: created on failure, never mutated afterwards
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub timestamp: DateTime<Local>,
    pub host: String,
    pub error: String,
}

impl FailureRecord {
    /// Record a failure for `host`, stamped with the current local time
    pub fn new(host: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            host: host.into(),
            error: error.into(),
        }
    }
}

/// Render the report body: header row plus one row per record
pub fn render_csv(failures: &[FailureRecord]) -> String {
    let mut body = String::from("Timestamp,ComputerName,Error\n");
    for record in failures {
        body.push_str(&format!(
            "{},{},{}\n",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            csv_field(&record.host),
            csv_field(&record.error),
        ));
    }
    body
}

/// Write the failure report atomically (temp file in the same directory,
/// then persist over the final path).
pub fn write_report(path: &Path, failures: &[FailureRecord]) -> RolloutResult<()> {
    use std::io::Write;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    tmp.write_all(render_csv(failures).as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Quote a CSV field when it contains a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
