//! Error types shared by all Supakeeper crates.

/// Errors raised by the keep-alive pipeline.
///
/// Only `Config` is fatal for a run. Probe failures never surface here: they
/// end up in the run report. Notification errors are logged and swallowed.
#[derive(Debug, thiserror::Error)]
pub enum KeeperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Notification failed: {0}")]
    Notify(String),
}

pub type Result<T> = std::result::Result<T, KeeperError>;
