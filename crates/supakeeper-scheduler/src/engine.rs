//! Scheduler engine: runs the keep-alive pipeline once or on a fixed interval.
//! Uses a plain tokio sleep between ticks: zero overhead while idle.

use std::sync::Arc;

use chrono::Utc;
use supakeeper_core::{KeeperConfig, KeeperError, Result, RunReport};
use supakeeper_probe::{HttpProber, ProjectProbe, RetryPolicy};
use tokio::sync::watch;

use crate::notify::{DispatchResult, Notifier};
use crate::orchestrator::Orchestrator;

/// The full pipeline: orchestrate all projects, then notify.
pub struct Keeper<P = HttpProber> {
    config: Arc<KeeperConfig>,
    orchestrator: Orchestrator<P>,
    notifier: Notifier,
}

impl Keeper<HttpProber> {
    /// Build the HTTP-backed keeper. Refuses configs with blocking issues.
    pub fn new(config: Arc<KeeperConfig>) -> Result<Self> {
        config.ensure_valid()?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("supakeeper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KeeperError::Http(format!("Failed to build HTTP client: {e}")))?;

        let prober = HttpProber::new(client.clone(), config.probe_timeout());
        let policy = RetryPolicy::new(config.retry_attempts, config.retry_delay());
        let notifier = Notifier::from_config(client, &config);

        Ok(Self::with_parts(config, Orchestrator::new(prober, policy), notifier))
    }
}

impl<P: ProjectProbe> Keeper<P> {
    pub fn with_parts(config: Arc<KeeperConfig>, orchestrator: Orchestrator<P>, notifier: Notifier) -> Self {
        if notifier.is_enabled() {
            let channels: Vec<&str> = notifier.targets().iter().map(|t| t.name()).collect();
            tracing::info!("🔔 Notifications enabled: {}", channels.join(", "));
        }
        Self { config, orchestrator, notifier }
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    /// Ping all configured projects without notifying.
    pub async fn ping_all(&self) -> RunReport {
        self.orchestrator.run(&self.config.projects).await
    }

    /// Send the summary for a finished report.
    pub async fn notify(&self, report: &RunReport) -> Vec<DispatchResult> {
        self.notifier.notify(report).await
    }

    /// One complete keep-alive cycle.
    pub async fn run_cycle(&self) -> RunReport {
        let report = self.ping_all().await;
        self.notify(&report).await;
        log_status(&report);
        report
    }
}

fn log_status(report: &RunReport) {
    if report.all_succeeded() {
        tracing::info!("📊 Status: {}/{} project(s) active", report.succeeded.len(), report.total());
    } else {
        tracing::warn!(
            "📊 Status: {}/{} project(s) active, {} failed",
            report.succeeded.len(),
            report.total(),
            report.failed.len()
        );
    }
}

/// Drives a [`Keeper`] once or forever.
pub struct Scheduler<P = HttpProber> {
    keeper: Keeper<P>,
}

impl<P: ProjectProbe> Scheduler<P> {
    pub fn new(keeper: Keeper<P>) -> Self {
        Self { keeper }
    }

    /// One-shot mode: a single cycle, report returned to the caller.
    pub async fn run_once(&self) -> RunReport {
        self.keeper.run_cycle().await
    }

    /// Daemon mode: cycle, sleep `interval`, repeat until `shutdown` flips to true.
    ///
    /// Shutdown interrupts both the sleep and an in-flight run. An interrupted
    /// run is dropped before its notification goes out.
    pub async fn run_daemon(&self, run_immediately: bool, mut shutdown: watch::Receiver<bool>) {
        let interval = self.keeper.config.interval();
        tracing::info!(
            "⏰ Supakeeper daemon started (interval: {} hours)",
            self.keeper.config.interval_hours
        );

        if run_immediately && !self.tick(&mut shutdown).await {
            tracing::info!("Scheduler stopped");
            return;
        }

        loop {
            let next_run = Utc::now()
                + chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::zero());
            tracing::info!("📅 Next run scheduled for: {}", next_run.format("%Y-%m-%d %H:%M:%S UTC"));

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = wait_for_shutdown(&mut shutdown) => {
                    tracing::info!("Received shutdown signal, stopping scheduler...");
                    break;
                }
            }

            if !self.tick(&mut shutdown).await {
                break;
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Run one cycle unless shutdown wins. Returns false when shutting down.
    async fn tick(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tracing::info!("Running scheduled keep-alive at {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));

        let report = tokio::select! {
            report = self.keeper.ping_all() => report,
            _ = wait_for_shutdown(shutdown) => {
                tracing::info!("Received shutdown signal during run, skipping notification");
                return false;
            }
        };

        self.keeper.notify(&report).await;
        log_status(&report);
        true
    }
}

/// Resolves once the flag is set. A dropped sender means nobody can stop us.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
