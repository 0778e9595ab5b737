//! # Supakeeper Core
//!
//! Shared building blocks for the keep-alive pipeline:
//! - `config`: environment-driven configuration (`KeeperConfig`, `ProjectConfig`)
//! - `error`: the `KeeperError` taxonomy used across the workspace
//! - `types`: probe results, per-project outcomes and the run report

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigIssue, IssueSeverity, KeeperConfig, ProjectConfig};
pub use error::{KeeperError, Result};
pub use types::{FailedProject, ProbeResult, ProjectOutcome, RunReport, RunSummary};
