//! Bypass tiers: the closed set of retrieval strategies.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::Serialize;
use tracing::debug;

use super::identity::HeaderSet;
use super::response::RawResponse;
use super::solver;
use crate::config::SolverSettings;
use crate::error::TierError;

/// Bypass method name that aliases the solver tier.
pub const SOLVER_METHOD_ALIAS: &str = "flaresolverr";

/// Bypass method names that select the headless browser tier.
pub const HEADLESS_METHODS: &[&str] = &["headless_browser", "headless", "browser"];

/// Tier category, recorded on every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    Direct,
    SolverProxy,
    HeaderRotation,
    HeadlessBrowser,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Direct => "direct",
            TierKind::SolverProxy => "solver_proxy",
            TierKind::HeaderRotation => "header_rotation",
            TierKind::HeadlessBrowser => "headless_browser",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One retrieval strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BypassTier {
    /// Plain request; 403/429/503 count as blocked, other 5xx as failed.
    Direct,
    /// Request through a challenge-solver endpoint.
    SolverProxy { endpoint: String },
    /// Plain request under a freshly generated identity; only < 400 is accepted.
    HeaderRotation { method: String },
    /// Placeholder that always fails with `Unimplemented`.
    HeadlessBrowser,
}

/// One attempt's request parameters.
#[derive(Debug, Clone)]
pub struct TierRequest<'a> {
    pub url: &'a str,
    pub method: Method,
    pub headers: &'a HeaderSet,
    pub timeout: Duration,
}

impl BypassTier {
    /// Build a bypass-stage tier from a configured method name.
    /// Returns `None` for the solver alias, which has its own stage.
    pub fn from_method(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        if normalized == SOLVER_METHOD_ALIAS {
            None
        } else if HEADLESS_METHODS.contains(&normalized.as_str()) {
            Some(BypassTier::HeadlessBrowser)
        } else {
            Some(BypassTier::HeaderRotation {
                method: name.trim().to_string(),
            })
        }
    }

    pub fn kind(&self) -> TierKind {
        match self {
            BypassTier::Direct => TierKind::Direct,
            BypassTier::SolverProxy { .. } => TierKind::SolverProxy,
            BypassTier::HeaderRotation { .. } => TierKind::HeaderRotation,
            BypassTier::HeadlessBrowser => TierKind::HeadlessBrowser,
        }
    }

    /// Name used in logs and attempt labels.
    pub fn name(&self) -> &str {
        match self {
            BypassTier::Direct => "normal",
            BypassTier::SolverProxy { .. } => SOLVER_METHOD_ALIAS,
            BypassTier::HeaderRotation { method } => method,
            BypassTier::HeadlessBrowser => "headless_browser",
        }
    }

    /// Perform one attempt.
    pub async fn attempt(
        &self,
        client: &Client,
        solver_settings: &SolverSettings,
        request: &TierRequest<'_>,
    ) -> Result<RawResponse, TierError> {
        match self {
            BypassTier::Direct | BypassTier::HeaderRotation { .. } => {
                let response = send_plain(client, request).await?;
                self.classify(response.status)?;
                Ok(response)
            }
            BypassTier::SolverProxy { endpoint } => {
                solver::solve(
                    client,
                    endpoint,
                    solver_settings,
                    request.url,
                    request.headers,
                )
                .await
            }
            BypassTier::HeadlessBrowser => {
                Err(TierError::Unimplemented("Headless browser".to_string()))
            }
        }
    }

    /// Decide whether a transport-level success is usable by this tier.
    pub fn classify(&self, status: u16) -> Result<(), TierError> {
        if matches!(status, 403 | 429 | 503) {
            return Err(TierError::Blocked { status });
        }
        let limit = match self {
            BypassTier::HeaderRotation { .. } => 400,
            _ => 500,
        };
        if status >= limit {
            return Err(TierError::Rejected { status });
        }
        Ok(())
    }
}

async fn send_plain(client: &Client, request: &TierRequest<'_>) -> Result<RawResponse, TierError> {
    debug!("{} {}", request.method, request.url);

    let mut builder = client
        .request(request.method.clone(), request.url)
        .timeout(request.timeout);
    for (name, value) in request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = builder.send().await?;
    Ok(RawResponse::read(response).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_method() {
        assert_eq!(BypassTier::from_method("flaresolverr"), None);
        assert_eq!(BypassTier::from_method("FlareSolverr"), None);
        assert_eq!(
            BypassTier::from_method("headless_browser"),
            Some(BypassTier::HeadlessBrowser)
        );
        assert_eq!(
            BypassTier::from_method("useragent"),
            Some(BypassTier::HeaderRotation {
                method: "useragent".to_string()
            })
        );
    }

    #[test]
    fn test_direct_classify() {
        let tier = BypassTier::Direct;
        assert_eq!(tier.classify(200), Ok(()));
        assert_eq!(tier.classify(404), Ok(()));
        assert_eq!(tier.classify(403), Err(TierError::Blocked { status: 403 }));
        assert_eq!(tier.classify(429), Err(TierError::Blocked { status: 429 }));
        assert_eq!(tier.classify(503), Err(TierError::Blocked { status: 503 }));
        assert_eq!(tier.classify(500), Err(TierError::Rejected { status: 500 }));
    }

    #[test]
    fn test_header_rotation_classify() {
        let tier = BypassTier::HeaderRotation {
            method: "headers".to_string(),
        };
        assert_eq!(tier.classify(301), Ok(()));
        assert_eq!(tier.classify(404), Err(TierError::Rejected { status: 404 }));
        assert_eq!(tier.classify(403), Err(TierError::Blocked { status: 403 }));
    }

    #[tokio::test]
    async fn test_headless_browser_is_unimplemented() {
        let headers = HeaderSet::new();
        let request = TierRequest {
            url: "https://x.test/",
            method: Method::GET,
            headers: &headers,
            timeout: Duration::from_secs(1),
        };
        let settings = crate::config::RetrievalConfig::default().solver;
        let err = BypassTier::HeadlessBrowser
            .attempt(&Client::new(), &settings, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, TierError::Unimplemented(_)));
        assert_eq!(err.to_string(), "Headless browser bypass not implemented yet");
    }

    #[test]
    fn test_names() {
        assert_eq!(BypassTier::Direct.name(), "normal");
        assert_eq!(
            BypassTier::SolverProxy {
                endpoint: "http://s".into()
            }
            .kind(),
            TierKind::SolverProxy
        );
        assert_eq!(TierKind::HeaderRotation.to_string(), "header_rotation");
    }
}
