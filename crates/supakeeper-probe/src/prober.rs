//! HTTP prober: walks the strategy chain against one project.
//!
//! Same shape as a provider failover chain: try primary → fallback₁ → fallback₂,
//! return on the first success, otherwise surface the last error.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use supakeeper_core::{ProbeResult, ProjectConfig};

use crate::strategy::Strategy;

/// Anything that can run one full keep-alive chain against a project.
#[async_trait]
pub trait ProjectProbe: Send + Sync {
    /// Run the chain once. Never errors: failure is reported in the result.
    async fn probe(&self, project: &ProjectConfig) -> ProbeResult;
}

/// Probes Supabase over plain HTTP with the project's API key.
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Execute a single strategy. Non-2xx, transport errors and timeouts are failures.
    pub async fn run_strategy(&self, strategy: Strategy, project: &ProjectConfig) -> ProbeResult {
        let (path, query) = strategy.request(project);
        let url = project.endpoint(&path);
        let started = Instant::now();

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .header("apikey", &project.api_key)
            .bearer_auth(&project.api_key)
            .timeout(self.timeout)
            .send()
            .await;

        let latency = started.elapsed();
        match resp {
            Ok(resp) if resp.status().is_success() => ProbeResult::success(strategy.name(), latency),
            Ok(resp) => {
                let status = resp.status();
                ProbeResult::failure(strategy.name(), format!("{strategy}: HTTP {status}"), latency)
            }
            Err(e) if e.is_timeout() => ProbeResult::failure(
                strategy.name(),
                format!("{strategy}: timed out after {}s", self.timeout.as_secs_f32()),
                latency,
            ),
            Err(e) => ProbeResult::failure(strategy.name(), format!("{strategy}: {e}"), latency),
        }
    }
}

#[async_trait]
impl ProjectProbe for HttpProber {
    async fn probe(&self, project: &ProjectConfig) -> ProbeResult {
        let mut last_failure = None;

        for strategy in Strategy::chain_for(project) {
            let result = self.run_strategy(strategy, project).await;
            if result.succeeded {
                tracing::debug!(
                    project = %project.name,
                    strategy = %strategy,
                    latency_ms = result.latency.as_millis() as u64,
                    "strategy succeeded"
                );
                return result;
            }
            tracing::debug!(
                project = %project.name,
                strategy = %strategy,
                error = result.error.as_deref().unwrap_or_default(),
                "strategy failed, trying next"
            );
            last_failure = Some(result);
        }

        last_failure.unwrap_or_else(|| {
            ProbeResult::failure("none", "no applicable strategies", Duration::ZERO)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn prober() -> HttpProber {
        HttpProber::new(reqwest::Client::new(), Duration::from_secs(2))
    }

    fn project(server: &MockServer, table: Option<&str>) -> ProjectConfig {
        ProjectConfig::new("test", &server.base_url(), "anon-key", table.map(String::from)).unwrap()
    }

    #[tokio::test]
    async fn test_table_query_success_short_circuits() {
        let server = MockServer::start_async().await;
        let table = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rest/v1/notes")
                    .query_param("limit", "1")
                    .header("apikey", "anon-key")
                    .header("authorization", "Bearer anon-key");
                then.status(200).body("[]");
            })
            .await;
        let users = server
            .mock_async(|when, then| {
                when.path("/auth/v1/admin/users");
                then.status(200);
            })
            .await;
        let ping = server
            .mock_async(|when, then| {
                when.path("/rest/v1/");
                then.status(200);
            })
            .await;

        let result = prober().probe(&project(&server, Some("notes"))).await;

        assert!(result.succeeded);
        assert_eq!(result.strategy_name, "table_query");
        table.assert_hits_async(1).await;
        users.assert_hits_async(0).await;
        ping.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_falls_back_until_auth_session() {
        let server = MockServer::start_async().await;
        let table = server
            .mock_async(|when, then| {
                when.path("/rest/v1/missing");
                then.status(404);
            })
            .await;
        let users = server
            .mock_async(|when, then| {
                when.path("/auth/v1/admin/users");
                then.status(403);
            })
            .await;
        let health = server
            .mock_async(|when, then| {
                when.method(GET).path("/auth/v1/health");
                then.status(200);
            })
            .await;
        let ping = server
            .mock_async(|when, then| {
                when.path("/rest/v1/");
                then.status(200);
            })
            .await;

        let result = prober().probe(&project(&server, Some("missing"))).await;

        assert!(result.succeeded);
        assert_eq!(result.strategy_name, "auth_session");
        table.assert_hits_async(1).await;
        users.assert_hits_async(1).await;
        health.assert_hits_async(1).await;
        ping.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_no_table_never_queries_rest_table() {
        let server = MockServer::start_async().await;
        let users = server
            .mock_async(|when, then| {
                when.path("/auth/v1/admin/users");
                then.status(200);
            })
            .await;

        let result = prober().probe(&project(&server, None)).await;

        assert!(result.succeeded);
        assert_eq!(result.strategy_name, "auth_users");
        users.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_all_strategies_fail_reports_last_error() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|_when, then| {
                then.status(500);
            })
            .await;

        let result = prober().probe(&project(&server, Some("notes"))).await;

        assert!(!result.succeeded);
        assert_eq!(result.strategy_name, "rest_ping");
        let error = result.error.unwrap();
        assert!(error.contains("rest_ping"), "{error}");
        assert!(error.contains("500"), "{error}");
        any.assert_hits_async(4).await;
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|_when, then| {
                then.status(200).delay(Duration::from_millis(500));
            })
            .await;

        let prober = HttpProber::new(reqwest::Client::new(), Duration::from_millis(50));
        let result = prober
            .run_strategy(Strategy::RestPing, &project(&server, None))
            .await;

        assert!(!result.succeeded);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_failure() {
        let project = ProjectConfig::new("down", "http://127.0.0.1:1", "k", None).unwrap();
        let result = prober().probe(&project).await;
        assert!(!result.succeeded);
        assert!(result.error.is_some());
    }
}
