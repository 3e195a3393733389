//! Configuration module for rollout
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority, applied in `main`)
//! 2. Environment variables (ROLLOUT_*)
//! 3. Explicit `--config` path / project `./rollout.toml`
//! 4. User config (~/.config/rollout/config.toml)
//! 5. Built-in defaults (lowest priority)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RolloutError, RolloutResult};
use crate::rollout::SkipStrategy;

/// Host list input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostsConfig {
    /// Delimited file holding the target list
    #[serde(default = "default_hosts_file")]
    pub file: PathBuf,

    /// Header column holding the host names
    #[serde(default = "default_hosts_column")]
    pub column: String,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            file: default_hosts_file(),
            column: default_hosts_column(),
        }
    }
}

fn default_hosts_file() -> PathBuf {
    PathBuf::from("hosts.csv")
}

fn default_hosts_column() -> String {
    "ComputerName".to_string()
}

/// Installer artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Local path of the installer package
    pub path: Option<PathBuf>,

    /// Staging folder on the target, as the target sees it
    #[serde(default = "default_destination")]
    pub destination: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: None,
            destination: default_destination(),
        }
    }
}

fn default_destination() -> String {
    r"C:\Temp".to_string()
}

/// Install command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Suppress installer UI on the target
    #[serde(default = "default_true")]
    pub quiet: bool,

    /// MSI properties appended to the command line
    #[serde(default = "default_features")]
    pub features: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            quiet: true,
            features: default_features(),
        }
    }
}

fn default_features() -> Vec<String> {
    vec![
        "ENABLE_PSREMOTING=1".to_string(),
        "ADD_PATH=1".to_string(),
        "REGISTER_MANIFEST=1".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

/// Availability probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Session configuration name to probe
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Attempt budget for the already-installed precheck
    #[serde(default = "default_precheck_attempts")]
    pub precheck_attempts: u32,

    /// Attempt budget for the post-install confirmation
    #[serde(default = "default_confirm_attempts")]
    pub confirm_attempts: u32,

    /// Fixed pause between attempts, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            precheck_attempts: default_precheck_attempts(),
            confirm_attempts: default_confirm_attempts(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "PowerShell.7".to_string()
}

fn default_precheck_attempts() -> u32 {
    1
}

fn default_confirm_attempts() -> u32 {
    15
}

fn default_interval_secs() -> u64 {
    1
}

/// Run-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Which idempotency check skips already-installed hosts
    #[serde(default)]
    pub strategy: SkipStrategy,

    /// Marker file name written next to the staged artifact on success
    #[serde(default = "default_marker_name")]
    pub marker_name: String,

    /// Where the failure report is exported
    #[serde(default = "default_report")]
    pub report: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            strategy: SkipStrategy::default(),
            marker_name: default_marker_name(),
            report: default_report(),
        }
    }
}

fn default_marker_name() -> String {
    "rollout.done".to_string()
}

fn default_report() -> PathBuf {
    PathBuf::from("failed-installs.csv")
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub hosts: HostsConfig,

    #[serde(default)]
    pub artifact: ArtifactConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default, rename = "rollout")]
    pub run: RunConfig,
}

/// Non-fatal configuration warning surfaced to CLI users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> RolloutResult<Self> {
        Ok(Self::load_with_warnings(path)?.0)
    }

    /// Load configuration and collect non-fatal warnings (unknown keys)
    pub fn load_with_warnings(path: &Path) -> RolloutResult<(Self, Vec<ConfigWarning>)> {
        let content = std::fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Config = serde_ignored::deserialize(deserializer, |p| {
            unknown_paths.push(p.to_string());
        })
        .map_err(|e| RolloutError::InvalidConfig {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_paths
            .into_iter()
            .map(|path_str| ConfigWarning {
                key: path_str,
                file: path.to_path_buf(),
            })
            .collect();

        Ok((config, warnings))
    }

    /// Load from an explicit path, the project config, the user config, or
    /// defaults - whichever is found first - then apply env overrides.
    pub fn discover(explicit: Option<&Path>) -> RolloutResult<Self> {
        if let Some(path) = explicit {
            // An explicitly named config that fails to load is fatal
            return Ok(with_env_overrides(Self::load(path)?));
        }

        let project_config = PathBuf::from("rollout.toml");
        if project_config.exists() {
            if let Ok(config) = Self::load(&project_config) {
                return Ok(with_env_overrides(config));
            }
        }

        if let Some(user_config_dir) = dirs::config_dir() {
            let user_config = user_config_dir.join("rollout/config.toml");
            if user_config.exists() {
                if let Ok(config) = Self::load(&user_config) {
                    return Ok(with_env_overrides(config));
                }
            }
        }

        Ok(with_env_overrides(Self::default()))
    }
}

/// Apply environment variable overrides (ROLLOUT_* prefix)
pub fn with_env_overrides(mut config: Config) -> Config {
    if let Ok(endpoint) = std::env::var("ROLLOUT_ENDPOINT") {
        if !endpoint.trim().is_empty() {
            config.probe.endpoint = endpoint;
        }
    }

    if let Ok(attempts) = std::env::var("ROLLOUT_CONFIRM_ATTEMPTS") {
        if let Ok(parsed) = attempts.trim().parse::<u32>() {
            if parsed > 0 {
                config.probe.confirm_attempts = parsed;
            }
        }
    }

    if let Ok(strategy) = std::env::var("ROLLOUT_STRATEGY") {
        match strategy.to_lowercase().as_str() {
            "probe" => config.run.strategy = SkipStrategy::Probe,
            "marker" => config.run.strategy = SkipStrategy::Marker,
            _ => {}
        }
    }

    if let Ok(report) = std::env::var("ROLLOUT_REPORT") {
        if !report.trim().is_empty() {
            config.run.report = PathBuf::from(report);
        }
    }

    config
}
