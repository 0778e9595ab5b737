//! Keep-alive strategies, in priority order.
//!
//! Querying real rows is the strongest activity signal, so it goes first.
//! A failure there is often a permission or missing-row issue rather than
//! connectivity, so the chain keeps going down to the plain REST ping.

use supakeeper_core::ProjectConfig;

/// One way of generating activity on a Supabase project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Read at most one row from the configured table via PostgREST.
    TableQuery,
    /// List one user through the auth admin API.
    AuthUsers,
    /// Hit the auth service health endpoint.
    AuthSession,
    /// Fetch the PostgREST root (OpenAPI description).
    RestPing,
}

impl Strategy {
    /// Full chain in priority order. New strategies are appended here.
    pub const CHAIN: [Strategy; 4] = [
        Strategy::TableQuery,
        Strategy::AuthUsers,
        Strategy::AuthSession,
        Strategy::RestPing,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::TableQuery => "table_query",
            Strategy::AuthUsers => "auth_users",
            Strategy::AuthSession => "auth_session",
            Strategy::RestPing => "rest_ping",
        }
    }

    /// Whether this strategy can run for the given project.
    pub fn applies_to(&self, project: &ProjectConfig) -> bool {
        match self {
            Strategy::TableQuery => project.table.is_some(),
            _ => true,
        }
    }

    /// Path (relative to the project URL) and query parameters for the request.
    pub fn request(&self, project: &ProjectConfig) -> (String, Vec<(&'static str, &'static str)>) {
        match self {
            Strategy::TableQuery => (
                format!("/rest/v1/{}", project.table.as_deref().unwrap_or_default()),
                vec![("select", "*"), ("limit", "1")],
            ),
            Strategy::AuthUsers => (
                "/auth/v1/admin/users".into(),
                vec![("page", "1"), ("per_page", "1")],
            ),
            Strategy::AuthSession => ("/auth/v1/health".into(), Vec::new()),
            Strategy::RestPing => ("/rest/v1/".into(), Vec::new()),
        }
    }

    /// Strategies applicable to a project, in priority order.
    pub fn chain_for(project: &ProjectConfig) -> Vec<Strategy> {
        Self::CHAIN
            .iter()
            .copied()
            .filter(|s| s.applies_to(project))
            .collect()
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
