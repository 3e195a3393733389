//! Remote access seams
//!
//! Abstracts the three remote capabilities the orchestrator needs: file
//! staging over the administrative share, remote command dispatch, and the
//! session probe used to confirm an endpoint answers. Each is its own trait
//! so tests can substitute recording fakes per seam.

mod command;
mod powershell;
mod share;

pub use command::InstallCommand;
pub use powershell::PowerShellRemoting;
pub use share::{admin_share_path, join_remote, AdminShare};

use thiserror::Error;

/// Error from a remote operation, always attached to the host it targeted
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    /// Session or share could not be reached
    #[error("connection to {host} failed: {message}")]
    Connection { host: String, message: String },

    /// Copy onto the target's share failed
    #[error("copy to {host} failed: {message}")]
    Copy { host: String, message: String },

    /// Write onto the target's share failed
    #[error("write on {host} failed: {message}")]
    Write { host: String, message: String },
}

/// File access on a target through its administrative share
///
/// Paths are Windows-style strings as seen *on the target*
/// (e.g. `C:\Temp\pwsh.msi`); implementations translate them to whatever
/// transport they use. The existence check plus copy is not atomic - the
/// orchestrator runs strictly sequentially per target, so no two stagers ever
/// race on the same host.
pub trait RemoteShare {
    /// Check whether `remote_path` exists on `host`
    fn exists(&self, host: &str, remote_path: &str) -> bool;

    /// Copy a local file to `remote_path` on `host`
    fn copy_in(
        &self,
        host: &str,
        local: &std::path::Path,
        remote_path: &str,
    ) -> Result<(), RemoteError>;

    /// Write a small text file at `remote_path` on `host`
    fn write_text(&self, host: &str, remote_path: &str, content: &str) -> Result<(), RemoteError>;
}

/// Remote command dispatch
///
/// Dispatch over the administrative channel is allowed to report false
/// negatives, so this contract returns no status at all: the call is
/// fire-and-forget and the truth about the installation is established by the
/// availability probe afterwards.
pub trait CommandDispatch {
    /// Run `command` on `host`, waiting for the remote process to exit
    fn dispatch(&self, host: &str, command: &InstallCommand);
}

/// Session probe against a named remoting endpoint
///
/// Success means the endpoint answered; the session is released immediately
/// and never reused. Probing a *named* configuration is the point - it proves
/// the freshly installed version's endpoint is up, not merely that the host
/// is reachable.
pub trait SessionProbe {
    fn open(&self, host: &str, endpoint: &str) -> Result<(), RemoteError>;
}
