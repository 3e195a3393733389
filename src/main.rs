//! rollout CLI - remote MSI rollout tool
//!
//! Usage: rollout <COMMAND>
//!
//! Commands:
//!   deploy  Stage the installer on each host, install, confirm availability
//!   hosts   Parse and display the host list
//!   probe   Check whether one host answers on the remoting endpoint

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use rollout::config::Config;
use rollout::error::RolloutError;
use rollout::poller::{poll_until_ready, PollPolicy};
use rollout::remote::{AdminShare, PowerShellRemoting};
use rollout::rollout::{Rollout, RolloutEvent, RolloutEventSink, RolloutOptions, SkipStrategy};

/// rollout - remote MSI rollout tool
#[derive(Parser, Debug)]
#[command(name = "rollout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output NDJSON events for CI
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stage the installer on each host, install, confirm availability
    Deploy {
        /// Host list file (overrides config)
        #[arg(long)]
        hosts: Option<PathBuf>,

        /// Header column holding the host names
        #[arg(long)]
        column: Option<String>,

        /// Local installer package (overrides config)
        #[arg(short, long)]
        installer: Option<PathBuf>,

        /// Staging folder on the targets
        #[arg(long)]
        dest: Option<String>,

        /// Session configuration name to probe
        #[arg(long)]
        endpoint: Option<String>,

        /// Idempotency strategy for already-installed hosts
        #[arg(long, value_enum)]
        strategy: Option<SkipStrategy>,

        /// Confirmation attempt budget
        #[arg(long)]
        attempts: Option<u32>,

        /// Failure report location
        #[arg(long)]
        report: Option<PathBuf>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse and display the host list (debugging)
    Hosts {
        /// Host list file (overrides config)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Header column holding the host names
        #[arg(long)]
        column: Option<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check whether one host answers on the remoting endpoint
    Probe {
        /// Host to probe
        #[arg(long)]
        host: String,

        /// Session configuration name to probe
        #[arg(long)]
        endpoint: Option<String>,

        /// Attempt budget
        #[arg(long)]
        attempts: Option<u32>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            hosts,
            column,
            installer,
            dest,
            endpoint,
            strategy,
            attempts,
            report,
            config,
            dry_run,
        } => cmd_deploy(DeployArgs {
            hosts,
            column,
            installer,
            dest,
            endpoint,
            strategy,
            attempts,
            report,
            config,
            dry_run,
            json: cli.json,
            verbose: cli.verbose,
        }),
        Commands::Hosts {
            file,
            column,
            config,
        } => cmd_hosts(file, column, config, cli.json),
        Commands::Probe {
            host,
            endpoint,
            attempts,
            config,
        } => cmd_probe(&host, endpoint, attempts, config, cli.json),
    }
}

struct DeployArgs {
    hosts: Option<PathBuf>,
    column: Option<String>,
    installer: Option<PathBuf>,
    dest: Option<String>,
    endpoint: Option<String>,
    strategy: Option<SkipStrategy>,
    attempts: Option<u32>,
    report: Option<PathBuf>,
    config: Option<PathBuf>,
    dry_run: bool,
    json: bool,
    verbose: u8,
}

fn cmd_deploy(args: DeployArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.json)?;

    let installer = args
        .installer
        .or_else(|| config.artifact.path.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("no installer configured - pass --installer or set [artifact] path")
        })?;
    if !installer.exists() {
        return Err(RolloutError::ArtifactNotFound { path: installer }.into());
    }

    let hosts_file = args.hosts.unwrap_or_else(|| config.hosts.file.clone());
    let column = args.column.unwrap_or_else(|| config.hosts.column.clone());
    let hosts = rollout::hosts::load_hosts(&hosts_file, &column)?;

    let interval = Duration::from_secs(config.probe.interval_secs);
    let options = RolloutOptions::new(&installer)
        .with_destination(args.dest.unwrap_or_else(|| config.artifact.destination.clone()))
        .with_endpoint(args.endpoint.unwrap_or_else(|| config.probe.endpoint.clone()))
        .with_features(config.install.features.clone())
        .with_quiet(config.install.quiet)
        .with_strategy(args.strategy.unwrap_or(config.run.strategy))
        .with_marker_name(config.run.marker_name.clone())
        .with_precheck(PollPolicy::new(config.probe.precheck_attempts, interval))
        .with_confirm(PollPolicy::new(
            args.attempts.unwrap_or(config.probe.confirm_attempts),
            interval,
        ))
        .with_report(Some(args.report.unwrap_or_else(|| config.run.report.clone())))
        .with_dry_run(args.dry_run);

    if !args.json {
        println!("📦 Rollout Deploy");
        println!("Installer: {}", installer.display());
        println!("Hosts: {} ({} targets)", hosts_file.display(), hosts.len());
        println!("Endpoint: {}", options.endpoint);
        if args.dry_run {
            println!("Mode: Dry run");
        }
        if args.verbose > 0 {
            println!("Destination: {}", options.destination);
            println!("Strategy: {:?}", options.strategy);
        }
        println!();
    }

    let sink: Arc<dyn RolloutEventSink> = if args.json {
        Arc::new(JsonSink)
    } else {
        Arc::new(ConsoleSink)
    };

    let runner = Rollout::new(
        AdminShare::new(),
        PowerShellRemoting::new(),
        PowerShellRemoting::new(),
    );
    let summary = runner.execute_with_events(&hosts, &options, sink);

    if args.json {
        let output = serde_json::json!({
            "event": "completed",
            "status": if summary.is_success() { "success" } else { "partial" },
            "installed": summary.installed.len(),
            "skipped": summary.skipped.len(),
            "failed": summary.failures.len(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("\n📊 Deploy Results:");
        println!("  ✓ Installed: {}", summary.installed.len());
        println!("  ⏭ Skipped: {}", summary.skipped.len());
        println!("  ✗ Failed: {}", summary.failures.len());
        for warning in &summary.warnings {
            println!("  ⚠ {}", warning);
        }
        if summary.is_success() && !args.dry_run {
            println!("\n🟢 All hosts accounted for.");
        }
    }

    if !summary.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_hosts(
    file: Option<PathBuf>,
    column: Option<String>,
    config: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config(config.as_deref(), json)?;
    let hosts_file = file.unwrap_or_else(|| config.hosts.file.clone());
    let column = column.unwrap_or_else(|| config.hosts.column.clone());

    let hosts = rollout::hosts::load_hosts(&hosts_file, &column)?;

    if json {
        for host in &hosts {
            let output = serde_json::json!({ "event": "host", "name": host });
            println!("{}", serde_json::to_string(&output)?);
        }
    } else {
        println!("🔍 Parsing host list: {}", hosts_file.display());
        println!("\nFound {} hosts:\n", hosts.len());
        for host in &hosts {
            println!("  - {}", host);
        }
    }

    Ok(())
}

fn cmd_probe(
    host: &str,
    endpoint: Option<String>,
    attempts: Option<u32>,
    config: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config(config.as_deref(), json)?;
    let endpoint = endpoint.unwrap_or_else(|| config.probe.endpoint.clone());
    let policy = PollPolicy::new(
        attempts.unwrap_or(config.probe.confirm_attempts),
        Duration::from_secs(config.probe.interval_secs),
    );

    if !json {
        println!("🩺 Probing {} on {}", host, endpoint);
    }

    let outcome = poll_until_ready(&PowerShellRemoting::new(), host, &endpoint, &policy);

    if json {
        let output = serde_json::json!({
            "event": "probe",
            "host": host,
            "endpoint": endpoint,
            "ready": outcome.ready,
            "attempts": outcome.attempts,
            "error": outcome.last_error,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else if outcome.ready {
        println!("🟢 {} answered after {} attempt(s)", host, outcome.attempts);
    } else {
        println!(
            "🔴 {} did not answer after {} attempt(s): {}",
            host,
            outcome.attempts,
            outcome.last_error.as_deref().unwrap_or("no session")
        );
    }

    if !outcome.ready {
        std::process::exit(1);
    }

    Ok(())
}

/// Load config, surfacing unknown-key warnings for explicitly named files
fn load_config(path: Option<&std::path::Path>, json: bool) -> Result<Config> {
    if let Some(path) = path {
        let (config, warnings) = Config::load_with_warnings(path)?;
        if !json {
            for warning in &warnings {
                println!(
                    "⚠ Unknown config key '{}' in {}",
                    warning.key,
                    warning.file.display()
                );
            }
        }
        Ok(rollout::config::with_env_overrides(config))
    } else {
        Ok(Config::discover(None)?)
    }
}

/// Console event sink with per-host progress lines
struct ConsoleSink;

impl RolloutEventSink for ConsoleSink {
    fn on_event(&self, event: RolloutEvent) {
        match event {
            RolloutEvent::Started { .. } | RolloutEvent::Completed { .. } => {}
            RolloutEvent::HostStarted { host, .. } => println!("→ {}", host),
            RolloutEvent::HostPlanned {
                share_path,
                command,
                ..
            } => {
                println!("  would stage to {}", share_path);
                println!("  would run {}", command);
            }
            RolloutEvent::HostSkipped { reason, .. } => println!("  ⏭ skipped ({})", reason),
            RolloutEvent::Staged { copied, .. } => {
                if copied {
                    println!("  ✓ staged installer");
                } else {
                    println!("  ✓ installer already staged");
                }
            }
            RolloutEvent::Installing { .. } => println!("  ⏳ installing..."),
            RolloutEvent::HostInstalled { attempts, .. } => {
                println!("  ✓ endpoint answered after {} attempt(s)", attempts)
            }
            RolloutEvent::HostFailed { error, .. } => println!("  ✗ {}", error),
            RolloutEvent::ReportWritten { path, count } => {
                println!("\n📄 Failure report: {} ({} rows)", path.display(), count)
            }
        }
    }
}

/// NDJSON event sink for CI
struct JsonSink;

impl RolloutEventSink for JsonSink {
    fn on_event(&self, event: RolloutEvent) {
        let line = match event {
            RolloutEvent::Started { host_count } => {
                serde_json::json!({ "event": "started", "hosts": host_count })
            }
            RolloutEvent::HostStarted { index, host } => {
                serde_json::json!({ "event": "host_started", "index": index, "host": host })
            }
            RolloutEvent::HostPlanned {
                host,
                share_path,
                command,
            } => serde_json::json!({
                "event": "host_planned", "host": host,
                "share_path": share_path, "command": command,
            }),
            RolloutEvent::HostSkipped {
                index,
                host,
                reason,
            } => serde_json::json!({
                "event": "host_skipped", "index": index, "host": host, "reason": reason,
            }),
            RolloutEvent::Staged {
                index,
                host,
                copied,
            } => serde_json::json!({
                "event": "staged", "index": index, "host": host, "copied": copied,
            }),
            RolloutEvent::Installing { index, host } => {
                serde_json::json!({ "event": "installing", "index": index, "host": host })
            }
            RolloutEvent::HostInstalled {
                index,
                host,
                attempts,
            } => serde_json::json!({
                "event": "host_installed", "index": index, "host": host, "attempts": attempts,
            }),
            RolloutEvent::HostFailed { index, host, error } => serde_json::json!({
                "event": "host_failed", "index": index, "host": host, "error": error,
            }),
            RolloutEvent::ReportWritten { path, count } => serde_json::json!({
                "event": "report_written", "path": path.display().to_string(), "count": count,
            }),
            RolloutEvent::Completed {
                installed,
                skipped,
                failed,
            } => serde_json::json!({
                "event": "run_completed", "installed": installed,
                "skipped": skipped, "failed": failed,
            }),
        };
        println!("{}", line);
    }
}
