//! Immutable retrieval snapshot built from the loaded configuration.

use std::time::Duration;

use super::Config;

/// Grace period added on top of the solver's own `maxTimeout`.
pub const SOLVER_TIMEOUT_GRACE: Duration = Duration::from_millis(5_000);

/// Everything the orchestrator needs for one retrieval.
///
/// Built once from a [`Config`] and shared read-only (behind an `Arc`)
/// across concurrent retrievals.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Per-attempt timeout for direct and header-rotation requests.
    pub timeout: Duration,
    pub normal_retries: u32,
    pub solver_retries: u32,
    pub bypass_retries: u32,
    /// Lower bound of the randomized inter-attempt delay (upper bound is twice this).
    pub retry_delay: Duration,
    /// Fixed wait before every solver and bypass attempt.
    pub fallback_delay: Duration,
    pub user_agents: Vec<String>,
    pub solver: SolverSettings,
    pub bypass: BypassSettings,
    pub proxy: Option<ProxySettings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub enabled: bool,
    pub endpoints: Vec<String>,
    pub max_timeout: Duration,
    /// Session id sent with each solve request when session affinity is on.
    pub session: Option<String>,
}

impl SolverSettings {
    /// Whether the solver tier participates in escalation.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.endpoints.is_empty()
    }

    /// HTTP timeout for one solve request.
    pub fn request_timeout(&self) -> Duration {
        self.max_timeout + SOLVER_TIMEOUT_GRACE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BypassSettings {
    pub enabled: bool,
    pub methods: Vec<String>,
    pub headless_browser: bool,
}

/// Outbound proxy for the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxySettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RetrievalConfig {
    pub fn from_config(config: &Config) -> Self {
        let requests = &config.requests;
        let solver = &config.flaresolverr;

        let session = (solver.session.enabled && !solver.session.id.is_empty())
            .then(|| solver.session.id.clone());

        let proxy = if config.proxy.enabled {
            config.proxy.servers.first().map(|server| {
                let url = if server.host.contains("://") {
                    format!("{}:{}", server.host, server.port)
                } else {
                    format!("http://{}:{}", server.host, server.port)
                };
                ProxySettings {
                    url,
                    username: server.auth.as_ref().map(|a| a.username.clone()),
                    password: server.auth.as_ref().map(|a| a.password.clone()),
                }
            })
        } else {
            None
        };

        Self {
            timeout: Duration::from_millis(requests.timeout),
            normal_retries: requests.normal_retries,
            solver_retries: requests.flaresolverr_retries,
            bypass_retries: requests.bypass_retries,
            retry_delay: Duration::from_millis(requests.retry_delay),
            fallback_delay: Duration::from_millis(config.bypass.fallback_delay),
            user_agents: requests.user_agents.clone(),
            solver: SolverSettings {
                enabled: solver.enabled,
                endpoints: solver.urls.clone(),
                max_timeout: Duration::from_millis(solver.max_timeout),
                session,
            },
            bypass: BypassSettings {
                enabled: config.bypass.enabled,
                methods: config.bypass.methods.clone(),
                headless_browser: config.bypass.headless_browser,
            },
            proxy,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
