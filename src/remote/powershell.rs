//! PowerShell-backed remote transport
//!
//! Implements command dispatch and the session probe by shelling out to
//! `powershell.exe`. Dispatch goes through `Invoke-Command`; the probe opens
//! a `New-PSSession` against the named configuration and removes it again.

use std::process::{Command, Stdio};

use super::{CommandDispatch, InstallCommand, RemoteError, SessionProbe};

/// Transport shelling out to the local PowerShell host
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerShellRemoting;

impl PowerShellRemoting {
    pub fn new() -> Self {
        Self
    }

    /// Check if powershell.exe can be spawned at all
    pub fn check_available() -> bool {
        Command::new("powershell.exe")
            .args(["-NoProfile", "-NonInteractive", "-Command", "exit 0"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn run_script(&self, script: &str) -> std::io::Result<std::process::Output> {
        Command::new("powershell.exe")
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
    }
}

/// Quote a value for interpolation into a PowerShell single-quoted string
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Script that runs `command` on `host` and waits for it to finish
fn invoke_script(host: &str, command: &InstallCommand) -> String {
    format!(
        "Invoke-Command -ComputerName {} -ScriptBlock {{ Start-Process -FilePath 'msiexec.exe' -ArgumentList {} -Wait }}",
        quote(host),
        quote(&argument_list(command)),
    )
}

/// The msiexec arguments without the executable itself
fn argument_list(command: &InstallCommand) -> String {
    command
        .argument_line()
        .strip_prefix("msiexec.exe ")
        .unwrap_or_default()
        .to_string()
}

/// Script that opens and immediately releases a session on the named endpoint
fn probe_script(host: &str, endpoint: &str) -> String {
    format!(
        "$s = New-PSSession -ComputerName {} -ConfigurationName {} -ErrorAction Stop; Remove-PSSession $s",
        quote(host),
        quote(endpoint),
    )
}

impl CommandDispatch for PowerShellRemoting {
    fn dispatch(&self, host: &str, command: &InstallCommand) {
        // No reliable status comes back over this channel; the availability
        // probe afterwards is the authoritative signal.
        let _ = self.run_script(&invoke_script(host, command));
    }
}

impl SessionProbe for PowerShellRemoting {
    fn open(&self, host: &str, endpoint: &str) -> Result<(), RemoteError> {
        let output = self
            .run_script(&probe_script(host, endpoint))
            .map_err(|e| RemoteError::Connection {
                host: host.to_string(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .next()
                .unwrap_or("session could not be opened")
                .to_string();
            Err(RemoteError::Connection {
                host: host.to_string(),
                message,
            })
        }
    }
}
