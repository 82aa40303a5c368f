//! Tiered retrieval: direct fetch, then challenge solver, then bypass methods.
//!
//! Tiers run strictly in order of increasing cost. Each tier has its own
//! retry budget and delay policy; every failed attempt is recorded so an
//! exhausted retrieval reports exactly what was tried and why it failed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Proxy};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use super::identity::{merge_headers, HeaderSet, IdentityPool};
use super::random::{RandomSource, ThreadRandom};
use super::response::RawResponse;
use super::tier::{BypassTier, TierKind, TierRequest};
use crate::config::RetrievalConfig;
use crate::error::{ConfigError, RetrievalError, TierError};

/// Maximum redirect hops followed by plain requests.
pub const MAX_REDIRECTS: usize = 5;

/// Per-call overrides.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Replaces the configured per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Extra headers; these win over generated identity headers.
    pub headers: HeaderSet,
    pub method: Method,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            headers: HeaderSet::new(),
            method: Method::GET,
        }
    }
}

impl FetchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }
}

/// One failed attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub tier: TierKind,
    /// 1-based attempt index within the tier (or endpoint/method).
    pub attempt: u32,
    /// 1-based solver endpoint index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<usize>,
    /// Bypass method name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(serialize_with = "serialize_display")]
    pub error: TierError,
    pub blocked: bool,
}

fn serialize_display<S: Serializer>(err: &TierError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}

impl AttemptRecord {
    pub fn new(tier: TierKind, attempt: u32, error: TierError) -> Self {
        Self {
            tier,
            attempt,
            endpoint: None,
            method: None,
            blocked: error.is_block(),
            error,
        }
    }

    pub fn with_endpoint(mut self, endpoint: usize) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    /// Short label such as `normal_attempt_2` or `flaresolverr_1_2`.
    pub fn label(&self) -> String {
        match (self.tier, &self.method, self.endpoint) {
            (TierKind::Direct, _, _) => format!("normal_attempt_{}", self.attempt),
            (TierKind::SolverProxy, _, Some(endpoint)) => {
                format!("flaresolverr_{}_{}", endpoint, self.attempt)
            }
            (_, Some(method), _) => format!("{}_{}", method, self.attempt),
            (tier, _, _) => format!("{}_{}", tier, self.attempt),
        }
    }
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.error)
    }
}

/// Result of one `fetch` call.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    Success(RawResponse),
    Failure { attempts: Vec<AttemptRecord> },
}

impl RetrievalOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RetrievalOutcome::Success(_))
    }

    /// Recorded failures (empty on success).
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            RetrievalOutcome::Success(_) => &[],
            RetrievalOutcome::Failure { attempts } => attempts,
        }
    }

    pub fn into_result(self) -> Result<RawResponse, RetrievalError> {
        match self {
            RetrievalOutcome::Success(response) => Ok(response),
            RetrievalOutcome::Failure { attempts } => Err(RetrievalError::Exhausted { attempts }),
        }
    }
}

/// Sequences bypass tiers for a single target URL.
#[derive(Clone)]
pub struct RetrievalOrchestrator {
    config: Arc<RetrievalConfig>,
    identity: IdentityPool,
    client: Client,
    random: Arc<dyn RandomSource>,
}

impl fmt::Debug for RetrievalOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalOrchestrator")
            .field("config", &self.config)
            .field("identity", &self.identity)
            .finish()
    }
}

impl RetrievalOrchestrator {
    /// Create an orchestrator with thread-local randomness.
    ///
    /// # Errors
    /// Fails on an empty user-agent pool, an enabled solver tier without
    /// endpoints, or an unusable proxy.
    pub fn new(config: Arc<RetrievalConfig>) -> Result<Self, ConfigError> {
        Self::with_random(config, Arc::new(ThreadRandom))
    }

    /// Create an orchestrator with an explicit randomness source.
    pub fn with_random(
        config: Arc<RetrievalConfig>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        if config.solver.enabled && config.solver.endpoints.is_empty() {
            return Err(ConfigError::NoSolverEndpoints);
        }
        let identity = IdentityPool::new(&config.user_agents, Arc::clone(&random))?;
        let client = build_client(&config)?;

        Ok(Self {
            config,
            identity,
            client,
            random,
        })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn identity(&self) -> &IdentityPool {
        &self.identity
    }

    /// Retrieve `url`, escalating through tiers until one succeeds.
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> RetrievalOutcome {
        let mut attempts = Vec::new();

        if let Some(response) = self.run_direct(url, options, &mut attempts).await {
            return RetrievalOutcome::Success(response);
        }

        if self.config.solver.is_active() {
            if let Some(response) = self.run_solver(url, options, &mut attempts).await {
                return RetrievalOutcome::Success(response);
            }
        }

        if self.config.bypass.enabled {
            if let Some(response) = self.run_bypass(url, options, &mut attempts).await {
                return RetrievalOutcome::Success(response);
            }
        }

        warn!(
            "All fetch methods failed for {} after {} attempt(s)",
            url,
            attempts.len()
        );
        RetrievalOutcome::Failure { attempts }
    }

    /// Bypass-stage tiers in configured order.
    pub fn bypass_tiers(&self) -> Vec<BypassTier> {
        let mut tiers: Vec<BypassTier> = self
            .config
            .bypass
            .methods
            .iter()
            .filter_map(|name| BypassTier::from_method(name))
            .collect();
        if self.config.bypass.headless_browser && !tiers.contains(&BypassTier::HeadlessBrowser) {
            tiers.push(BypassTier::HeadlessBrowser);
        }
        tiers
    }

    async fn run_direct(
        &self,
        url: &str,
        options: &FetchOptions,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Option<RawResponse> {
        let tier = BypassTier::Direct;
        let retries = self.config.normal_retries;
        let mut headers = self.headers(url, options);

        for attempt in 1..=retries {
            debug!("Normal fetch attempt {}/{}: {}", attempt, retries, url);
            match self.attempt(&tier, url, options, &headers).await {
                Ok(response) => return Some(response),
                Err(e) => {
                    warn!("Normal fetch attempt {} failed: {}", attempt, e);
                    attempts.push(AttemptRecord::new(TierKind::Direct, attempt, e));
                    if attempt < retries {
                        self.sleep(self.jittered_retry_delay()).await;
                        headers = self.headers(url, options);
                    }
                }
            }
        }
        None
    }

    async fn run_solver(
        &self,
        url: &str,
        options: &FetchOptions,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Option<RawResponse> {
        let endpoints = &self.config.solver.endpoints;
        let retries = self.config.solver_retries;
        let headers = self.headers(url, options);

        for (idx, endpoint) in endpoints.iter().enumerate() {
            let tier = BypassTier::SolverProxy {
                endpoint: endpoint.clone(),
            };

            for attempt in 1..=retries {
                debug!(
                    "FlareSolverr URL {}/{} attempt {}/{} ({})",
                    idx + 1,
                    endpoints.len(),
                    attempt,
                    retries,
                    endpoint
                );
                self.sleep(self.config.fallback_delay).await;

                match self.attempt(&tier, url, options, &headers).await {
                    Ok(response) => {
                        info!("FlareSolverr URL {} solved {}", idx + 1, url);
                        return Some(response);
                    }
                    Err(e) => {
                        warn!("FlareSolverr URL {} attempt {} failed: {}", idx + 1, attempt, e);
                        attempts.push(
                            AttemptRecord::new(TierKind::SolverProxy, attempt, e)
                                .with_endpoint(idx + 1),
                        );
                        if attempt < retries {
                            self.sleep(self.config.retry_delay).await;
                        }
                    }
                }
            }

            if idx + 1 < endpoints.len() {
                debug!("Trying next FlareSolverr URL");
                self.sleep(self.config.retry_delay).await;
            }
        }
        None
    }

    async fn run_bypass(
        &self,
        url: &str,
        options: &FetchOptions,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Option<RawResponse> {
        let retries = self.config.bypass_retries;

        for tier in self.bypass_tiers() {
            for attempt in 1..=retries {
                debug!(
                    "Bypass method {} attempt {}/{}",
                    tier.name(),
                    attempt,
                    retries
                );
                self.sleep(self.config.fallback_delay).await;

                let headers = self.headers(url, options);
                match self.attempt(&tier, url, options, &headers).await {
                    Ok(response) => {
                        info!("Bypass method {} succeeded", tier.name());
                        return Some(response);
                    }
                    Err(e) => {
                        warn!(
                            "Bypass method {} attempt {} failed: {}",
                            tier.name(),
                            attempt,
                            e
                        );
                        attempts.push(
                            AttemptRecord::new(tier.kind(), attempt, e).with_method(tier.name()),
                        );
                        if attempt < retries {
                            self.sleep(self.config.retry_delay).await;
                        }
                    }
                }
            }
        }
        None
    }

    async fn attempt(
        &self,
        tier: &BypassTier,
        url: &str,
        options: &FetchOptions,
        headers: &HeaderSet,
    ) -> Result<RawResponse, TierError> {
        let request = TierRequest {
            url,
            method: options.method.clone(),
            headers,
            timeout: options.timeout.unwrap_or(self.config.timeout),
        };
        tier.attempt(&self.client, &self.config.solver, &request)
            .await
    }

    /// Fresh identity headers with per-call overrides applied.
    fn headers(&self, url: &str, options: &FetchOptions) -> HeaderSet {
        merge_headers(self.identity.headers_for(Some(url)), &options.headers)
    }

    /// Uniform delay in `[retry_delay, 2 * retry_delay]`.
    pub fn jittered_retry_delay(&self) -> Duration {
        let base = self.config.retry_delay.as_millis() as u64;
        Duration::from_millis(self.random.between(base, base.saturating_mul(2)))
    }

    async fn sleep(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn build_client(config: &RetrievalConfig) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(config.timeout.max(config.solver.request_timeout()))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true);

    if let Some(proxy) = &config.proxy {
        let mut p =
            Proxy::all(&proxy.url).map_err(|e| ConfigError::InvalidProxy(format!("{}: {}", proxy.url, e)))?;
        if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
            p = p.basic_auth(user, pass);
        }
        debug!("Routing requests through proxy {}", proxy.url);
        builder = builder.proxy(p);
    }

    builder
        .build()
        .map_err(|e| ConfigError::Client(e.to_string()))
}
