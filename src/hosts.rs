//! Host list loading
//!
//! Reads a delimited host file, projects a single named column, deduplicates
//! and returns the hosts in sorted order. The sort order only exists so that
//! logging and the failure report are deterministic across runs.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{RolloutError, RolloutResult};

/// Load host names from a delimited file.
///
/// The first row is a header; `column` selects which field holds the host
/// names (case-insensitive match). Extra columns are ignored. Duplicate and
/// blank entries are dropped.
pub fn load_hosts(path: &Path, column: &str) -> RolloutResult<Vec<String>> {
    if !path.exists() {
        return Err(RolloutError::HostFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();

    let header = lines.next().unwrap_or_default();
    let index = split_row(header)
        .iter()
        .position(|field| field.eq_ignore_ascii_case(column))
        .ok_or_else(|| RolloutError::HostColumnMissing {
            column: column.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut hosts = BTreeSet::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(value) = split_row(line).get(index) {
            if !value.is_empty() {
                hosts.insert(value.clone());
            }
        }
    }

    if hosts.is_empty() {
        return Err(RolloutError::EmptyHostList {
            path: path.to_path_buf(),
        });
    }

    Ok(hosts.into_iter().collect())
}

/// Split one CSV row into trimmed fields.
///
/// Handles double-quoted fields with `""` escapes, which is as much CSV as a
/// host export ever uses.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}
