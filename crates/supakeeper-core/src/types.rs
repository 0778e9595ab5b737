//! Data model for a keep-alive run.
//!
//! ```text
//! Strategy call ──► ProbeResult ──► ProjectOutcome (one per project)
//!                                        └──► RunReport (one per tick) ──► RunSummary
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single strategy call against one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Which strategy produced this result.
    pub strategy_name: String,
    pub succeeded: bool,
    /// Failure detail (status code or transport error).
    pub error: Option<String>,
    /// Wall time of the request.
    pub latency: Duration,
}

impl ProbeResult {
    pub fn success(strategy_name: &str, latency: Duration) -> Self {
        Self {
            strategy_name: strategy_name.to_string(),
            succeeded: true,
            error: None,
            latency,
        }
    }

    pub fn failure(strategy_name: &str, error: impl Into<String>, latency: Duration) -> Self {
        Self {
            strategy_name: strategy_name.to_string(),
            succeeded: false,
            error: Some(error.into()),
            latency,
        }
    }
}

/// Final result for one project within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOutcome {
    pub project_name: String,
    pub succeeded: bool,
    /// Number of full strategy chains tried.
    pub attempts: u32,
    /// Most recent failure detail. `None` on success.
    pub last_error: Option<String>,
    /// Strategy that kept the project alive.
    pub strategy: Option<String>,
    /// Latency of the successful probe.
    pub latency: Option<Duration>,
}

impl ProjectOutcome {
    pub fn succeeded(project_name: &str, attempts: u32, probe: &ProbeResult) -> Self {
        Self {
            project_name: project_name.to_string(),
            succeeded: true,
            attempts,
            last_error: None,
            strategy: Some(probe.strategy_name.clone()),
            latency: Some(probe.latency),
        }
    }

    pub fn failed(project_name: &str, attempts: u32, last_error: Option<String>) -> Self {
        Self {
            project_name: project_name.to_string(),
            succeeded: false,
            attempts,
            last_error,
            strategy: None,
            latency: None,
        }
    }

    /// Latency in whole milliseconds, if the project succeeded.
    pub fn latency_ms(&self) -> Option<u128> {
        self.latency.map(|d| d.as_millis())
    }
}

/// Aggregated outcome of one orchestrator run.
///
/// Both sequences keep the configuration order of the projects.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub succeeded: Vec<ProjectOutcome>,
    pub failed: Vec<ProjectOutcome>,
}

impl RunReport {
    /// Partition outcomes (given in configuration order) into a report.
    pub fn from_outcomes(outcomes: Vec<ProjectOutcome>) -> Self {
        let (succeeded, failed) = outcomes.into_iter().partition(|o| o.succeeded);
        Self {
            timestamp: Utc::now(),
            succeeded,
            failed,
        }
    }

    pub fn empty() -> Self {
        Self::from_outcomes(Vec::new())
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            success: self.all_succeeded(),
            total: self.total(),
            succeeded: self.succeeded.iter().map(|o| o.project_name.clone()).collect(),
            failed: self
                .failed
                .iter()
                .map(|o| FailedProject {
                    name: o.project_name.clone(),
                    attempts: o.attempts,
                    error: o.last_error.clone(),
                })
                .collect(),
            timestamp: self.timestamp,
        }
    }
}

/// Serializable digest of a run, suitable as a serverless response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub success: bool,
    pub total: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedProject>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedProject {
    pub name: String,
    pub attempts: u32,
    pub error: Option<String>,
}
