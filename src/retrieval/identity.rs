//! Browser identity: rotating user agents and per-host referers.

use std::collections::BTreeMap;
use std::sync::Arc;

use url::Url;

use super::random::RandomSource;
use crate::error::ConfigError;

/// Request headers keyed by canonical header name.
pub type HeaderSet = BTreeMap<String, String>;

/// Referer used for hosts without a platform-specific entry.
pub const GENERIC_REFERER: &str = "https://www.google.com/";

/// Host fragments mapped to the referer their platform expects.
const PLATFORM_REFERERS: &[(&[&str], &str)] = &[
    (&["youtube.com", "youtu.be"], "https://www.youtube.com/"),
    (&["vimeo.com"], "https://vimeo.com/"),
    (&["dailymotion.com"], "https://www.dailymotion.com/"),
];

const BASELINE_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Accept-Encoding", "gzip, deflate, br"),
    ("DNT", "1"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Cache-Control", "max-age=0"),
];

/// Supplies browser-like request headers from the configured user-agent pool.
#[derive(Clone)]
pub struct IdentityPool {
    user_agents: Arc<[String]>,
    random: Arc<dyn RandomSource>,
}

impl std::fmt::Debug for IdentityPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityPool")
            .field("user_agents", &self.user_agents.len())
            .finish()
    }
}

impl IdentityPool {
    /// Create a pool. Fails if `user_agents` is empty.
    pub fn new(
        user_agents: &[String],
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        if user_agents.is_empty() {
            return Err(ConfigError::EmptyUserAgentPool);
        }
        Ok(Self {
            user_agents: user_agents.into(),
            random,
        })
    }

    /// Uniformly random user agent from the pool.
    pub fn next_user_agent(&self) -> &str {
        let idx = self.random.index(self.user_agents.len());
        &self.user_agents[idx]
    }

    /// Baseline browser headers plus a fresh user agent and, when a target
    /// URL is given, a referer chosen for its host.
    pub fn headers_for(&self, url: Option<&str>) -> HeaderSet {
        let mut headers: HeaderSet = BASELINE_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        headers.insert("User-Agent".to_string(), self.next_user_agent().to_string());

        if let Some(url) = url {
            headers.insert("Referer".to_string(), referer_for(url).to_string());
        }

        headers
    }
}

/// Referer for a target URL; malformed URLs get the generic referer.
pub fn referer_for(url: &str) -> &'static str {
    let host = match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(h) => h.to_lowercase(),
            None => return GENERIC_REFERER,
        },
        Err(_) => return GENERIC_REFERER,
    };

    PLATFORM_REFERERS
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| host.contains(f)))
        .map(|(_, referer)| *referer)
        .unwrap_or(GENERIC_REFERER)
}

/// Overlay `overrides` on `base`, replacing entries case-insensitively.
pub fn merge_headers(mut base: HeaderSet, overrides: &HeaderSet) -> HeaderSet {
    for (name, value) in overrides {
        base.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        base.insert(name.clone(), value.clone());
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::random::SeededRandom;

    fn pool(agents: &[&str]) -> IdentityPool {
        let agents: Vec<String> = agents.iter().map(|s| s.to_string()).collect();
        IdentityPool::new(&agents, Arc::new(SeededRandom::new(3))).unwrap()
    }

    #[test]
    fn test_empty_pool_is_config_error() {
        let err = IdentityPool::new(&[], Arc::new(SeededRandom::new(0))).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyUserAgentPool));
    }

    #[test]
    fn test_next_user_agent_from_pool() {
        let pool = pool(&["A/1", "B/2", "C/3"]);
        for _ in 0..20 {
            assert!(["A/1", "B/2", "C/3"].contains(&pool.next_user_agent()));
        }
    }

    #[test]
    fn test_headers_include_baseline_and_identity() {
        let pool = pool(&["Mozilla/5.0 Test"]);
        let headers = pool.headers_for(Some("https://example.org/page"));
        assert_eq!(headers["User-Agent"], "Mozilla/5.0 Test");
        assert_eq!(headers["Referer"], GENERIC_REFERER);
        assert_eq!(headers["DNT"], "1");
        assert_eq!(headers["Sec-Fetch-Mode"], "navigate");
        assert!(headers.contains_key("Accept-Language"));
        assert!(headers.contains_key("Cache-Control"));
    }

    #[test]
    fn test_headers_without_url_have_no_referer() {
        let headers = pool(&["X"]).headers_for(None);
        assert!(!headers.contains_key("Referer"));
    }

    #[test]
    fn test_referer_for_platforms() {
        assert_eq!(
            referer_for("https://www.youtube.com/watch?v=1"),
            "https://www.youtube.com/"
        );
        assert_eq!(referer_for("https://youtu.be/abc"), "https://www.youtube.com/");
        assert_eq!(referer_for("https://player.vimeo.com/v/1"), "https://vimeo.com/");
        assert_eq!(
            referer_for("https://www.DailyMotion.com/video/x"),
            "https://www.dailymotion.com/"
        );
        assert_eq!(referer_for("https://news.example.com/"), GENERIC_REFERER);
    }

    #[test]
    fn test_referer_for_malformed_url() {
        assert_eq!(referer_for("not a url"), GENERIC_REFERER);
        assert_eq!(referer_for(""), GENERIC_REFERER);
    }

    #[test]
    fn test_merge_headers_case_insensitive() {
        let base = pool(&["UA"]).headers_for(None);
        let mut overrides = HeaderSet::new();
        overrides.insert("user-agent".to_string(), "Custom/1.0".to_string());
        overrides.insert("Range".to_string(), "bytes=0-1024".to_string());

        let merged = merge_headers(base, &overrides);
        assert_eq!(merged["user-agent"], "Custom/1.0");
        assert!(!merged.contains_key("User-Agent"));
        assert_eq!(merged["Range"], "bytes=0-1024");
    }
}
