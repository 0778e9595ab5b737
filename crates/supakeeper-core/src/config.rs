//! Supakeeper configuration system.
//!
//! Everything comes from the process environment, optionally seeded from a
//! `.env` file. A single project uses `SUPABASE_URL` / `SUPABASE_KEY`;
//! additional projects use numbered slots (`SUPABASE_URL_1`, `SUPABASE_KEY_1`, ...).

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{KeeperError, Result};

/// Supabase pauses free-tier projects after a week without activity.
pub const PAUSE_THRESHOLD_HOURS: f64 = 168.0;

/// Longest accepted interval (one year).
pub const MAX_INTERVAL_HOURS: f64 = 8760.0;

const SINGLE_PROJECT_NAME: &str = "Default Project";

/// Connection info for one Supabase project.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectConfig {
    pub name: String,
    /// Project URL without trailing slash, e.g. `https://abc.supabase.co`.
    pub base_url: String,
    /// Anon (or service role) key, sent as `apikey` and bearer token.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Optional table to read from for the strongest keep-alive signal.
    pub table: Option<String>,
}

impl ProjectConfig {
    /// Build a project, rejecting empty credentials and unparsable URLs.
    pub fn new(name: &str, url: &str, api_key: &str, table: Option<String>) -> Result<Self> {
        let url = url.trim();
        let api_key = api_key.trim();
        if url.is_empty() {
            return Err(KeeperError::Config(format!("Project '{name}': URL is required")));
        }
        if api_key.is_empty() {
            return Err(KeeperError::Config(format!("Project '{name}': API key is required")));
        }
        reqwest::Url::parse(url)
            .map_err(|e| KeeperError::Config(format!("Project '{name}': invalid URL '{url}': {e}")))?;

        let table = table.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        if let Some(t) = &table {
            // The table name becomes a single path segment of the REST URL.
            if t.chars().any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control()) {
                return Err(KeeperError::Config(format!(
                    "Project '{name}': invalid table name '{t}'"
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table,
        })
    }

    /// Absolute URL for a path under the project, e.g. `/rest/v1/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Whether the project points at a local Supabase stack (`supabase start`).
    pub fn is_local(&self) -> bool {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| matches!(h, "localhost" | "127.0.0.1" | "[::1]" | "::1")))
            .unwrap_or(false)
    }

    /// URL shortened for tabular display.
    pub fn display_url(&self, max: usize) -> String {
        if self.base_url.chars().count() <= max {
            self.base_url.clone()
        } else {
            let head: String = self.base_url.chars().take(max.saturating_sub(3)).collect();
            format!("{head}...")
        }
    }
}

/// Severity of a configuration finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A single finding from [`KeeperConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: IssueSeverity,
    pub message: String,
}

impl ConfigIssue {
    fn error(message: impl Into<String>) -> Self {
        Self { severity: IssueSeverity::Error, message: message.into() }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self { severity: IssueSeverity::Warning, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            IssueSeverity::Error => write!(f, "{}", self.message),
            IssueSeverity::Warning => write!(f, "Warning: {}", self.message),
        }
    }
}

/// Root configuration, immutable once loaded.
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    pub projects: Vec<ProjectConfig>,
    pub interval_hours: f64,
    /// Total strategy-chain attempts per project.
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
    pub probe_timeout_secs: u64,
    pub log_level: String,
    /// `None` disables the file sink.
    pub log_file: Option<PathBuf>,
    pub console_output: bool,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub webhook_url: Option<String>,
}

fn default_interval_hours() -> f64 { 48.0 }
fn default_retry_attempts() -> u32 { 3 }
fn default_retry_delay() -> u64 { 30 }
fn default_probe_timeout() -> u64 { 10 }
fn default_log_level() -> String { "INFO".into() }
fn default_log_file() -> PathBuf { PathBuf::from("logs/supakeeper.log") }

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            interval_hours: default_interval_hours(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay(),
            probe_timeout_secs: default_probe_timeout(),
            log_level: default_log_level(),
            log_file: Some(default_log_file()),
            console_output: true,
            telegram_bot_token: None,
            telegram_chat_id: None,
            webhook_url: None,
        }
    }
}

impl KeeperConfig {
    /// Load from `.env` in the working directory (if any) and the environment.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(KeeperError::Config(format!("Failed to read .env: {e}")));
            }
        }
        Self::from_env()
    }

    /// Load from a specific env file, then the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        dotenvy::from_path(path).map_err(|e| {
            KeeperError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_env()
    }

    /// Resolve configuration from the current process environment.
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Resolve configuration from an explicit key/value map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| -> Option<String> {
            vars.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        let mut projects = Vec::new();

        // Single project slot
        match (get("SUPABASE_URL"), get("SUPABASE_KEY")) {
            (Some(url), Some(key)) => {
                let name = get("SUPABASE_NAME").unwrap_or_else(|| SINGLE_PROJECT_NAME.into());
                projects.push(ProjectConfig::new(&name, &url, &key, get("SUPABASE_TABLE"))?);
            }
            (Some(_), None) => {
                return Err(KeeperError::Config("SUPABASE_URL is set but SUPABASE_KEY is missing".into()));
            }
            (None, Some(_)) => {
                return Err(KeeperError::Config("SUPABASE_KEY is set but SUPABASE_URL is missing".into()));
            }
            (None, None) => {}
        }

        // Numbered slots, sorted numerically (2 before 10)
        let slots: BTreeSet<u32> = vars
            .keys()
            .filter_map(|k| {
                k.strip_prefix("SUPABASE_URL_")
                    .or_else(|| k.strip_prefix("SUPABASE_KEY_"))
            })
            .filter_map(|idx| idx.parse().ok())
            .collect();

        for idx in slots {
            let url = get(&format!("SUPABASE_URL_{idx}"));
            let key = get(&format!("SUPABASE_KEY_{idx}"));
            match (url, key) {
                (Some(url), Some(key)) => {
                    let name = get(&format!("SUPABASE_NAME_{idx}")).unwrap_or_else(|| format!("Project {idx}"));
                    let table = get(&format!("SUPABASE_TABLE_{idx}"));
                    projects.push(ProjectConfig::new(&name, &url, &key, table)?);
                }
                (None, None) => {}
                (Some(_), None) => {
                    return Err(KeeperError::Config(format!(
                        "SUPABASE_URL_{idx} is set but SUPABASE_KEY_{idx} is missing"
                    )));
                }
                (None, Some(_)) => {
                    return Err(KeeperError::Config(format!(
                        "SUPABASE_KEY_{idx} is set but SUPABASE_URL_{idx} is missing"
                    )));
                }
            }
        }

        let log_file = match vars.get("LOG_FILE") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v.trim())),
            None => Some(default_log_file()),
        };

        Ok(Self {
            projects,
            interval_hours: parse_var(vars, "KEEPALIVE_INTERVAL_HOURS", default_interval_hours())?,
            retry_attempts: parse_var(vars, "RETRY_ATTEMPTS", default_retry_attempts())?,
            retry_delay_secs: parse_var(vars, "RETRY_DELAY", default_retry_delay())?,
            probe_timeout_secs: parse_var(vars, "PROBE_TIMEOUT", default_probe_timeout())?,
            log_level: get("LOG_LEVEL").unwrap_or_else(default_log_level).to_uppercase(),
            log_file,
            console_output: get("CONSOLE_OUTPUT").map(|v| parse_bool(&v)).unwrap_or(true),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            webhook_url: get("WEBHOOK_URL"),
        })
    }

    /// Check the resolved configuration. Warnings do not block a run.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.projects.is_empty() {
            issues.push(ConfigIssue::error("No projects configured"));
        }

        for project in &self.projects {
            if !project.base_url.starts_with("https://") && !project.is_local() {
                issues.push(ConfigIssue::error(format!(
                    "Project '{}': URL must start with https://",
                    project.name
                )));
            }
        }

        if self.interval_hours <= 0.0 || !self.interval_hours.is_finite() {
            issues.push(ConfigIssue::error("Interval hours must be positive"));
        } else if self.interval_hours > MAX_INTERVAL_HOURS {
            issues.push(ConfigIssue::error(format!(
                "Interval hours must be at most {MAX_INTERVAL_HOURS}"
            )));
        } else if self.interval_hours > PAUSE_THRESHOLD_HOURS {
            issues.push(ConfigIssue::warning(
                "Interval exceeds 168 hours (7 days). Supabase pauses projects after 7 days of inactivity.",
            ));
        }

        if self.retry_attempts == 0 {
            issues.push(ConfigIssue::error("RETRY_ATTEMPTS must be at least 1"));
        }

        if self.telegram_bot_token.is_some() != self.telegram_chat_id.is_some() {
            issues.push(ConfigIssue::warning(
                "Telegram needs both TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID; notifications disabled",
            ));
        }

        issues
    }

    /// Fail fast when any blocking issue exists.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors: Vec<String> = self
            .validate()
            .into_iter()
            .filter(ConfigIssue::is_error)
            .map(|i| i.message)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(KeeperError::Config(errors.join("; ")))
        }
    }

    /// Copy of this config restricted to one project (case-insensitive name).
    pub fn with_only_project(&self, name: &str) -> Option<Self> {
        let project = self
            .projects
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))?
            .clone();
        Some(Self {
            projects: vec![project],
            ..self.clone()
        })
    }

    pub fn has_telegram(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }

    pub fn has_webhook(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Saturates instead of panicking on values `validate` would reject.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_hours.max(0.0) * 3600.0).unwrap_or(Duration::MAX)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn parse_var<T: FromStr>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T> {
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|_| KeeperError::Config(format!("Invalid value for {key}: '{raw}'"))),
        None => Ok(default),
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let cfg = KeeperConfig::from_vars(&HashMap::new()).unwrap();
        assert!(cfg.projects.is_empty());
        assert_eq!(cfg.interval_hours, 48.0);
        assert_eq!(cfg.retry_attempts, 3);
        assert_eq!(cfg.retry_delay(), Duration::from_secs(30));
        assert_eq!(cfg.probe_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.log_level, "INFO");
        assert_eq!(cfg.log_file, Some(PathBuf::from("logs/supakeeper.log")));
        assert!(cfg.console_output);
        assert!(!cfg.has_telegram());
        assert!(!cfg.has_webhook());
    }

    #[test]
    fn test_single_project() {
        let cfg = KeeperConfig::from_vars(&vars(&[
            ("SUPABASE_URL", "https://abc.supabase.co/"),
            ("SUPABASE_KEY", "anon"),
            ("SUPABASE_TABLE", "notes"),
        ]))
        .unwrap();
        assert_eq!(cfg.projects.len(), 1);
        let p = &cfg.projects[0];
        assert_eq!(p.name, "Default Project");
        assert_eq!(p.base_url, "https://abc.supabase.co");
        assert_eq!(p.table.as_deref(), Some("notes"));
        assert_eq!(p.endpoint("/rest/v1/"), "https://abc.supabase.co/rest/v1/");
    }

    #[test]
    fn test_numbered_projects_sorted_numerically() {
        let cfg = KeeperConfig::from_vars(&vars(&[
            ("SUPABASE_URL", "https://main.supabase.co"),
            ("SUPABASE_KEY", "k0"),
            ("SUPABASE_NAME", "Main"),
            ("SUPABASE_URL_10", "https://ten.supabase.co"),
            ("SUPABASE_KEY_10", "k10"),
            ("SUPABASE_URL_2", "https://two.supabase.co"),
            ("SUPABASE_KEY_2", "k2"),
            ("SUPABASE_NAME_2", "Second"),
        ]))
        .unwrap();
        let names: Vec<_> = cfg.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Main", "Second", "Project 10"]);
    }

    #[test]
    fn test_missing_key_fails_fast() {
        let err = KeeperConfig::from_vars(&vars(&[("SUPABASE_URL_3", "https://x.supabase.co")])).unwrap_err();
        assert!(matches!(err, KeeperError::Config(ref m) if m.contains("SUPABASE_KEY_3")));

        let err = KeeperConfig::from_vars(&vars(&[("SUPABASE_KEY", "anon")])).unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = KeeperConfig::from_vars(&vars(&[("RETRY_DELAY", "soon")])).unwrap_err();
        assert!(err.to_string().contains("RETRY_DELAY"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = ProjectConfig::new("p", "not a url", "k", None).unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));
        assert!(ProjectConfig::new("p", "https://x.supabase.co", "  ", None).is_err());
    }

    #[test]
    fn test_empty_log_file_disables_sink() {
        let cfg = KeeperConfig::from_vars(&vars(&[("LOG_FILE", ""), ("CONSOLE_OUTPUT", "false")])).unwrap();
        assert_eq!(cfg.log_file, None);
        assert!(!cfg.console_output);
    }

    #[test]
    fn test_validate_no_projects() {
        let cfg = KeeperConfig::default();
        let issues = cfg.validate();
        assert!(issues.iter().any(|i| i.is_error() && i.message.contains("No projects")));
        assert!(cfg.ensure_valid().is_err());
    }

    #[test]
    fn test_validate_interval_bounds() {
        let mut cfg = KeeperConfig::default();
        cfg.projects.push(ProjectConfig::new("p", "https://x.supabase.co", "k", None).unwrap());
        assert!(cfg.validate().is_empty());

        cfg.interval_hours = 200.0;
        let issues = cfg.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, IssueSeverity::Warning);
        assert!(cfg.ensure_valid().is_ok());

        cfg.interval_hours = 0.0;
        assert!(cfg.ensure_valid().is_err());
    }

    #[test]
    fn test_huge_interval_is_rejected_without_panicking() {
        let cfg = KeeperConfig::from_vars(&vars(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_KEY", "k"),
            ("KEEPALIVE_INTERVAL_HOURS", "1e16"),
        ]))
        .unwrap();
        let issues = cfg.validate();
        assert!(issues.iter().any(|i| i.is_error() && i.message.contains("at most")));
        assert!(cfg.ensure_valid().is_err());
        assert_eq!(cfg.interval(), Duration::MAX);

        let mut year = cfg.clone();
        year.interval_hours = MAX_INTERVAL_HOURS;
        assert!(year.ensure_valid().is_ok());
        assert_eq!(year.interval(), Duration::from_secs(8760 * 3600));
    }

    #[test]
    fn test_table_name_must_be_single_path_segment() {
        for bad in ["a/b", "notes?select=id", "notes#x", "my table", "50%"] {
            let err = ProjectConfig::new("p", "https://x.supabase.co", "k", Some(bad.into())).unwrap_err();
            assert!(err.to_string().contains("invalid table name"), "{bad}");
        }
        let ok = ProjectConfig::new("p", "https://x.supabase.co", "k", Some(" health_check ".into())).unwrap();
        assert_eq!(ok.table.as_deref(), Some("health_check"));
    }

    #[test]
    fn test_load_from_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.env");
        std::fs::write(
            &path,
            "SUPABASE_URL_977=https://fromfile.supabase.co\nSUPABASE_KEY_977=file-key\nSUPABASE_NAME_977=FromFile\n",
        )
        .unwrap();

        let cfg = KeeperConfig::load_from(&path).unwrap();
        let project = cfg.projects.iter().find(|p| p.name == "FromFile").unwrap();
        assert_eq!(project.base_url, "https://fromfile.supabase.co");
        assert_eq!(project.api_key, "file-key");

        let err = KeeperConfig::load_from(&dir.path().join("missing.env")).unwrap_err();
        assert!(matches!(err, KeeperError::Config(ref m) if m.contains("missing.env")));
    }

    #[test]
    fn test_validate_http_only_for_local_stack() {
        let mut cfg = KeeperConfig::default();
        cfg.projects.push(ProjectConfig::new("local", "http://127.0.0.1:54321", "k", None).unwrap());
        assert!(cfg.validate().is_empty());

        cfg.projects.push(ProjectConfig::new("remote", "http://x.supabase.co", "k", None).unwrap());
        let issues = cfg.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("remote"));
    }

    #[test]
    fn test_with_only_project_is_case_insensitive() {
        let cfg = KeeperConfig::from_vars(&vars(&[
            ("SUPABASE_URL_1", "https://a.supabase.co"),
            ("SUPABASE_KEY_1", "k"),
            ("SUPABASE_NAME_1", "Blog"),
            ("SUPABASE_URL_2", "https://b.supabase.co"),
            ("SUPABASE_KEY_2", "k"),
            ("SUPABASE_NAME_2", "Shop"),
        ]))
        .unwrap();
        let only = cfg.with_only_project("shop").unwrap();
        assert_eq!(only.projects.len(), 1);
        assert_eq!(only.projects[0].name, "Shop");
        assert!(cfg.with_only_project("missing").is_none());
    }

    #[test]
    fn test_display_url_truncates() {
        let p = ProjectConfig::new("p", "https://abcdefghijklmnopqrstuvwxyz.supabase.co", "k", None).unwrap();
        let short = p.display_url(20);
        assert_eq!(short.chars().count(), 20);
        assert!(short.ends_with("..."));
    }
}
