//! # Supakeeper Scheduler
//!
//! Orchestration, notification and scheduling for the keep-alive pipeline.
//!
//! ## Architecture
//! ```text
//! Scheduler (daemon: tokio sleep loop │ one-shot)
//!   └── Keeper
//!         ├── Orchestrator ── per project, concurrently ──► execute_with_retry
//!         │                                                    └── HttpProber
//!         └── RunReport ──► Notifier
//!                              ├── Telegram (sendMessage)
//!                              └── Webhook (Discord / Slack JSON POST)
//! ```

pub mod dispatch;
pub mod engine;
pub mod notify;
pub mod orchestrator;

pub use dispatch::{targets_from_config, NotifyTarget};
pub use engine::{Keeper, Scheduler};
pub use notify::{DispatchResult, Notification, NotifyLevel, Notifier};
pub use orchestrator::Orchestrator;
