//! Orchestrator: fans a keep-alive attempt out to every configured project.
//!
//! All project futures are driven from the calling task and joined before the
//! report is built. Nothing is spawned, so nothing outlives a run.

use futures::stream::{self, StreamExt};
use supakeeper_core::{ProjectConfig, ProjectOutcome, RunReport};
use supakeeper_probe::{execute_with_retry, ProjectProbe, RetryPolicy};

/// Upper bound on projects pinged at the same time.
pub const MAX_PARALLEL: usize = 10;

/// Runs the retrying strategy chain for all projects and partitions the results.
pub struct Orchestrator<P> {
    prober: P,
    policy: RetryPolicy,
}

impl<P: ProjectProbe> Orchestrator<P> {
    pub fn new(prober: P, policy: RetryPolicy) -> Self {
        Self { prober, policy }
    }

    /// Ping every project and wait for all of them.
    ///
    /// Both halves of the report keep the order of `projects`, whatever
    /// order the requests complete in.
    pub async fn run(&self, projects: &[ProjectConfig]) -> RunReport {
        if projects.is_empty() {
            tracing::warn!("No enabled projects to ping");
            return RunReport::empty();
        }

        tracing::info!("🚀 Starting keep-alive check for {} project(s)", projects.len());

        let mut indexed: Vec<(usize, ProjectOutcome)> = stream::iter(projects.iter().enumerate())
            .map(|(idx, project)| async move {
                (idx, execute_with_retry(&self.prober, project, &self.policy).await)
            })
            .buffer_unordered(MAX_PARALLEL)
            .collect()
            .await;

        indexed.sort_by_key(|(idx, _)| *idx);
        let report = RunReport::from_outcomes(indexed.into_iter().map(|(_, o)| o).collect());

        tracing::info!(
            total = report.total(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Keep-alive check finished"
        );
        report
    }
}
