//! Bounded retry with a fixed delay.
//!
//! No exponential backoff and no jitter: Supabase either answers or the
//! project is paused, and a steady cadence keeps log output predictable.

use std::future::Future;
use std::time::Duration;

use supakeeper_core::{ProjectConfig, ProjectOutcome};

use crate::prober::ProjectProbe;

/// Retry parameters: total attempts and the pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

/// What a retried operation ended with, and how many tries it took.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The delay is only applied
    /// between attempts, never after the last one.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome { result: Ok(value), attempts: attempt };
                }
                Err(e) if attempt >= self.max_attempts => {
                    return RetryOutcome { result: Err(e), attempts: attempt };
                }
                Err(_) => {
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(30))
    }
}

/// Keep one project alive: the full strategy chain under `policy`.
pub async fn execute_with_retry<P>(prober: &P, project: &ProjectConfig, policy: &RetryPolicy) -> ProjectOutcome
where
    P: ProjectProbe + ?Sized,
{
    let outcome = policy
        .run(|attempt| async move {
            tracing::debug!(project = %project.name, attempt, "pinging project");
            let probe = prober.probe(project).await;
            if probe.succeeded {
                return Ok(probe);
            }
            let error = probe.error.unwrap_or_else(|| "unknown error".into());
            if attempt < policy.max_attempts {
                tracing::warn!(
                    project = %project.name,
                    attempt,
                    "⚠️ Attempt {} failed: {}. Retrying in {}s...",
                    attempt,
                    error,
                    policy.delay.as_secs()
                );
            }
            Err(error)
        })
        .await;

    match outcome.result {
        Ok(probe) => {
            tracing::info!(
                project = %project.name,
                strategy = %probe.strategy_name,
                attempts = outcome.attempts,
                "✅ Project active ({}ms)",
                probe.latency.as_millis()
            );
            ProjectOutcome::succeeded(&project.name, outcome.attempts, &probe)
        }
        Err(error) => {
            tracing::error!(
                project = %project.name,
                attempts = outcome.attempts,
                "❌ Failed after {} attempts: {}",
                outcome.attempts,
                error
            );
            ProjectOutcome::failed(&project.name, outcome.attempts, Some(error))
        }
    }
}
