//! Install command construction
//!
//! Builds the `msiexec` invocation that runs on the target: package path,
//! quiet switch, and the MSI property flags baked in up front. The flag
//! semantics belong to the installer; this type only assembles the argument
//! line.

use std::fmt;

/// A remote installer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    /// Package path as seen on the target (e.g. `C:\Temp\pwsh.msi`)
    package: String,
    /// Suppress all installer UI (`/qn`)
    quiet: bool,
    /// MSI properties appended verbatim (e.g. `ENABLE_PSREMOTING=1`)
    features: Vec<String>,
}

impl InstallCommand {
    /// Quiet install of an MSI package with no extra properties
    pub fn msi(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            quiet: true,
            features: Vec::new(),
        }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    /// Package path on the target
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The full command line executed on the target
    pub fn argument_line(&self) -> String {
        let mut line = format!("msiexec.exe /i \"{}\"", self.package);
        if self.quiet {
            line.push_str(" /qn");
        }
        for feature in &self.features {
            line.push(' ');
            line.push_str(feature);
        }
        line
    }
}

impl fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argument_line())
    }
}
