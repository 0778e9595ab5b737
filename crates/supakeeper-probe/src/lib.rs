//! # Supakeeper Probe
//!
//! Per-project keep-alive logic:
//!
//! ```text
//! execute_with_retry (RetryPolicy: N attempts, fixed delay)
//!   └── ProjectProbe::probe (HttpProber)
//!         ├── TableQuery    GET /rest/v1/{table}?select=*&limit=1   (only if configured)
//!         ├── AuthUsers     GET /auth/v1/admin/users?per_page=1
//!         ├── AuthSession   GET /auth/v1/health
//!         └── RestPing      GET /rest/v1/
//! ```
//!
//! The first strategy to succeed ends the chain.

pub mod prober;
pub mod retry;
pub mod strategy;

pub use prober::{HttpProber, ProjectProbe};
pub use retry::{execute_with_retry, RetryOutcome, RetryPolicy};
pub use strategy::Strategy;
