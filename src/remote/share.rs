//! Administrative share file access
//!
//! Implements the `RemoteShare` port over `\\host\<drive>$\...` UNC paths,
//! the convention the target operating environment exposes for every local
//! drive. `C:\Temp\pwsh.msi` on `web01` is reached as
//! `\\web01\C$\Temp\pwsh.msi`.

use std::path::{Path, PathBuf};

use super::{RemoteError, RemoteShare};

/// Map a Windows path on the target to its administrative share UNC path.
///
/// The drive-letter colon becomes a dollar sign; the convention must be
/// preserved exactly for the target environment to resolve it. Paths without
/// a drive letter are joined under the host as-is.
pub fn admin_share_path(host: &str, remote_path: &str) -> PathBuf {
    let shared = match remote_path.split_once(':') {
        Some((drive, rest)) => format!("{}${}", drive, rest),
        None => remote_path.trim_start_matches('\\').to_string(),
    };
    PathBuf::from(format!(r"\\{}\{}", host, shared))
}

/// Join a folder and file name using the target's path separator
pub fn join_remote(folder: &str, name: &str) -> String {
    format!("{}\\{}", folder.trim_end_matches('\\'), name)
}

/// `RemoteShare` implementation backed by the OS resolving UNC paths
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminShare;

impl AdminShare {
    pub fn new() -> Self {
        Self
    }
}

impl RemoteShare for AdminShare {
    fn exists(&self, host: &str, remote_path: &str) -> bool {
        admin_share_path(host, remote_path).exists()
    }

    fn copy_in(&self, host: &str, local: &Path, remote_path: &str) -> Result<(), RemoteError> {
        let dest = admin_share_path(host, remote_path);
        std::fs::copy(local, &dest)
            .map(|_| ())
            .map_err(|e| RemoteError::Copy {
                host: host.to_string(),
                message: format!("{} -> {}: {}", local.display(), dest.display(), e),
            })
    }

    fn write_text(&self, host: &str, remote_path: &str, content: &str) -> Result<(), RemoteError> {
        let dest = admin_share_path(host, remote_path);
        std::fs::write(&dest, content).map_err(|e| RemoteError::Write {
            host: host.to_string(),
            message: format!("{}: {}", dest.display(), e),
        })
    }
}
