//! # Supakeeper: keep Supabase free-tier projects alive
//!
//! Usage:
//!   supakeeper                          # Ping all projects once and exit
//!   supakeeper run                      # Daemon: ping now, then every KEEPALIVE_INTERVAL_HOURS
//!   supakeeper run --once --json        # One-shot, JSON summary on stdout (cron / serverless)
//!   supakeeper status                   # Show configured projects
//!   supakeeper validate                 # Check the configuration
//!   supakeeper ping --project Blog      # Ping a single project by name

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use supakeeper_core::{IssueSeverity, KeeperConfig, RunReport};
use supakeeper_scheduler::{Keeper, Scheduler};
use tokio::sync::watch;

#[derive(Parser)]
#[command(
    name = "supakeeper",
    version,
    about = "🟢 Supakeeper - Keep your Supabase projects alive and prevent them from being paused"
)]
struct Cli {
    /// Env file to load instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Keep projects active (daemon by default)
    Run {
        /// Run once and exit
        #[arg(short = '1', long)]
        once: bool,

        /// In daemon mode, wait for the first interval before pinging
        #[arg(long)]
        no_immediate: bool,

        /// Print the run summary as JSON (with --once)
        #[arg(long)]
        json: bool,
    },
    /// Show configured Supabase projects
    Status,
    /// Validate the configuration
    Validate,
    /// Ping projects once with minimal output
    Ping {
        /// Ping only the project with this name (case-insensitive)
        #[arg(short, long)]
        project: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✗ Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.env_file {
        Some(path) => KeeperConfig::load_from(path),
        None => KeeperConfig::load(),
    }
    .context("Failed to load configuration")?;

    let command = cli.command.unwrap_or(Command::Run {
        once: true,
        no_immediate: false,
        json: false,
    });

    match command {
        Command::Status => Ok(print_status(&config)),
        Command::Validate => Ok(print_validation(&config)),
        Command::Run { once, no_immediate, json } => {
            logging::init(&config)?;
            if !report_issues(&config) {
                return Ok(ExitCode::FAILURE);
            }
            print_banner();
            let keeper = Keeper::new(Arc::new(config))?;
            let scheduler = Scheduler::new(keeper);

            if once {
                let report = scheduler.run_once().await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report.summary())?);
                }
                Ok(exit_code(&report))
            } else {
                let (tx, rx) = watch::channel(false);
                tokio::spawn(async move {
                    shutdown_signal().await;
                    let _ = tx.send(true);
                });
                scheduler.run_daemon(!no_immediate, rx).await;
                Ok(ExitCode::SUCCESS)
            }
        }
        Command::Ping { project } => {
            let config = match project {
                Some(name) => match config.with_only_project(&name) {
                    Some(filtered) => filtered,
                    None => {
                        eprintln!("✗ Project '{name}' not found");
                        eprintln!("Available projects:");
                        for p in &config.projects {
                            eprintln!("  - {}", p.name);
                        }
                        return Ok(ExitCode::FAILURE);
                    }
                },
                None => config,
            };
            logging::init(&config)?;
            let keeper = Keeper::new(Arc::new(config))?;
            let report = keeper.run_cycle().await;
            Ok(exit_code(&report))
        }
    }
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Log validation findings. Returns false when a blocking error exists.
fn report_issues(config: &KeeperConfig) -> bool {
    let mut ok = true;
    for issue in config.validate() {
        match issue.severity {
            IssueSeverity::Warning => tracing::warn!("⚠️ {}", issue.message),
            IssueSeverity::Error => {
                tracing::error!("✗ {}", issue.message);
                ok = false;
            }
        }
    }
    if config.projects.is_empty() {
        eprintln!("Please set SUPABASE_URL and SUPABASE_KEY in your .env file.");
    }
    ok
}

fn print_banner() {
    tracing::info!("🟢 Supakeeper v{} - Keep Supabase Alive", env!("CARGO_PKG_VERSION"));
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

fn print_status(config: &KeeperConfig) -> ExitCode {
    println!();
    println!("Supakeeper Status");
    println!();

    if config.projects.is_empty() {
        println!("⚠️  No projects configured.");
        println!("Please set SUPABASE_URL and SUPABASE_KEY in your .env file.");
        return ExitCode::SUCCESS;
    }

    println!("{:<24} {:<42} {}", "Project", "URL", "Table");
    println!("{}", "─".repeat(80));
    for p in &config.projects {
        println!(
            "{:<24} {:<42} {}",
            p.name,
            p.display_url(40),
            p.table.as_deref().unwrap_or("-")
        );
    }
    println!();
    println!("Total projects: {}", config.projects.len());
    println!("Check interval: every {} hours", config.interval_hours);
    println!(
        "Retries: {} attempts, {}s apart",
        config.retry_attempts, config.retry_delay_secs
    );
    let mut channels = Vec::new();
    if config.has_telegram() {
        channels.push("telegram");
    }
    if config.has_webhook() {
        channels.push("webhook");
    }
    println!(
        "Notifications: {}",
        if channels.is_empty() { "none".to_string() } else { channels.join(", ") }
    );
    println!();
    ExitCode::SUCCESS
}

fn print_validation(config: &KeeperConfig) -> ExitCode {
    let issues = config.validate();

    if issues.is_empty() {
        println!("✓ Configuration is valid");
        println!("  Found {} project(s)", config.projects.len());
        for p in &config.projects {
            println!("    - {}: {}", p.name, p.display_url(40));
        }
        return ExitCode::SUCCESS;
    }

    for issue in &issues {
        match issue.severity {
            IssueSeverity::Warning => println!("⚠ {}", issue.message),
            IssueSeverity::Error => println!("✗ {}", issue.message),
        }
    }

    if issues.iter().any(|i| i.is_error()) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
