//! Notification system: turns a run report into a summary and fans it out.
//! Best-effort: a channel that fails is logged and skipped, never escalated.

use chrono::{DateTime, Utc};
use supakeeper_core::{KeeperConfig, Result, RunReport};

use crate::dispatch::{self, NotifyTarget};

/// Overall tone of a run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    /// Every project answered.
    Success,
    /// At least one project exhausted its retries.
    Failure,
}

/// A rendered run summary, independent of the channel it goes to.
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotifyLevel,
    pub title: String,
    /// Multi-line body listing the relevant projects.
    pub body: String,
    /// One-line fallback for plain-text consumers (Slack `text`).
    pub headline: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Build the summary for a report. `None` when no project was pinged.
    pub fn from_report(report: &RunReport) -> Option<Self> {
        if report.total() == 0 {
            return None;
        }

        if report.all_succeeded() {
            let lines: Vec<String> = report
                .succeeded
                .iter()
                .map(|o| match o.latency_ms() {
                    Some(ms) => format!("✅ {} ({ms}ms)", o.project_name),
                    None => format!("✅ {}", o.project_name),
                })
                .collect();
            let count = report.succeeded.len();
            Some(Self {
                level: NotifyLevel::Success,
                title: "🎉 Supakeeper - All Projects Active".into(),
                body: format!("Successfully pinged {count} project(s):\n\n{}", lines.join("\n")),
                headline: format!("✅ Supakeeper: Successfully pinged {count} project(s)"),
                timestamp: report.timestamp,
            })
        } else {
            let lines: Vec<String> = report
                .failed
                .iter()
                .map(|o| {
                    let error = o.last_error.as_deref().unwrap_or("unknown error");
                    format!("❌ {}: {error} (after {} attempts)", o.project_name, o.attempts)
                })
                .collect();
            let count = report.failed.len();
            Some(Self {
                level: NotifyLevel::Failure,
                title: "⚠️ Supakeeper - Some Projects Failed".into(),
                body: format!("Failed to ping {count} project(s):\n\n{}", lines.join("\n")),
                headline: format!("⚠️ Supakeeper: Failed to ping {count} project(s)"),
                timestamp: report.timestamp,
            })
        }
    }

    pub fn formatted_time(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

/// Outcome of sending to one channel.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: &'static str,
    pub result: Result<()>,
}

/// Sends run summaries to every configured channel.
pub struct Notifier {
    client: reqwest::Client,
    targets: Vec<NotifyTarget>,
}

impl Notifier {
    pub fn new(client: reqwest::Client, targets: Vec<NotifyTarget>) -> Self {
        Self { client, targets }
    }

    /// Notifier for the channels present in the config.
    pub fn from_config(client: reqwest::Client, config: &KeeperConfig) -> Self {
        Self::new(client, dispatch::targets_from_config(config))
    }

    pub fn is_enabled(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn targets(&self) -> &[NotifyTarget] {
        &self.targets
    }

    /// Dispatch the report summary to all channels, each independently.
    ///
    /// Failures are logged and returned for inspection; they never abort the
    /// other channels.
    pub async fn notify(&self, report: &RunReport) -> Vec<DispatchResult> {
        if self.targets.is_empty() {
            return Vec::new();
        }
        let Some(notification) = Notification::from_report(report) else {
            return Vec::new();
        };

        let sends = self.targets.iter().map(|target| {
            let notification = &notification;
            async move {
                let result = dispatch::dispatch(&self.client, notification, target).await;
                match &result {
                    Ok(()) => tracing::debug!(channel = target.name(), "notification sent"),
                    Err(e) => tracing::warn!(channel = target.name(), "⚠️ Notification failed: {e}"),
                }
                DispatchResult { channel: target.name(), result }
            }
        });

        futures::future::join_all(sends).await
    }
}
