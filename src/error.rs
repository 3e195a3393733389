//! Error types for rollout
//!
//! Uses `thiserror` for library errors. Everything in this enum is fatal to
//! the whole run: per-host failures never surface here, they become
//! `FailureRecord`s on the run summary instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rollout operations
pub type RolloutResult<T> = Result<T, RolloutError>;

/// Main error type for rollout operations
#[derive(Error, Debug)]
pub enum RolloutError {
    /// Host list file does not exist
    #[error("host list not found: {path}")]
    HostFileNotFound { path: PathBuf },

    /// Host list header is missing the configured column
    #[error("column '{column}' not found in header of {path}")]
    HostColumnMissing { column: String, path: PathBuf },

    /// Host list produced zero targets after dedup
    #[error("no hosts found in {path} - nothing to deploy to")]
    EmptyHostList { path: PathBuf },

    /// Installer artifact does not exist
    #[error("installer not found: {path}")]
    ArtifactNotFound { path: PathBuf },

    /// Invalid configuration file
    #[error("invalid config in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
