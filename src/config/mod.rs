//! Configuration management for Web2Video.
//!
//! The file layout follows the service's `config.yml` (camelCase keys).
//! Every section has defaults, so a partial file only overrides what it names.

mod handle;
mod retrieval;

pub use handle::ConfigHandle;
pub use retrieval::{BypassSettings, ProxySettings, RetrievalConfig, SolverSettings};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name used for config file discovery.
pub const CONFIG_NAME: &str = "web2video";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub flaresolverr: FlaresolverrConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub requests: RequestsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub bypass: BypassConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Challenge-solver proxy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "FlaresolverrFile")]
pub struct FlaresolverrConfig {
    pub enabled: bool,
    pub urls: Vec<String>,
    pub port: u16,
    /// Milliseconds the solver may spend on one challenge.
    pub max_timeout: u64,
    pub session: SessionConfig,
}

impl Default for FlaresolverrConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            urls: default_solver_urls(),
            port: default_solver_port(),
            max_timeout: default_solver_max_timeout(),
            session: SessionConfig::default(),
        }
    }
}

/// `flaresolverr` section as written on disk, including the legacy
/// single-endpoint `url` key.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlaresolverrFile {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    urls: Option<Vec<String>>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default = "default_solver_port")]
    port: u16,
    #[serde(default = "default_solver_max_timeout")]
    max_timeout: u64,
    #[serde(default)]
    session: SessionConfig,
}

impl From<FlaresolverrFile> for FlaresolverrConfig {
    fn from(file: FlaresolverrFile) -> Self {
        let urls = match (file.urls, file.url) {
            (Some(urls), _) => urls,
            (None, Some(url)) => {
                tracing::info!(
                    "Converted legacy flaresolverr.url to urls array for backward compatibility"
                );
                vec![url]
            }
            (None, None) => default_solver_urls(),
        };
        Self {
            enabled: file.enabled,
            urls,
            port: file.port,
            max_timeout: file.max_timeout,
            session: file.session,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_session_id")]
    pub id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            id: default_session_id(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub servers: Vec<ProxyServer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyServer {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<ProxyAuth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// Request timing and retry budgets. All durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestsConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
    #[serde(default = "default_normal_retries")]
    pub normal_retries: u32,
    #[serde(default = "default_solver_retries")]
    pub flaresolverr_retries: u32,
    #[serde(default = "default_bypass_retries")]
    pub bypass_retries: u32,
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for RequestsConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            normal_retries: default_normal_retries(),
            flaresolverr_retries: default_solver_retries(),
            bypass_retries: default_bypass_retries(),
            user_agents: default_user_agents(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cors_origins")]
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: default_cors_origins(),
        }
    }
}

/// File extensions recognized during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    #[serde(default = "default_video_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: String,
    #[serde(default = "default_download_timeout")]
    pub download_timeout: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            extensions: default_video_extensions(),
            image_extensions: default_image_extensions(),
            max_file_size: default_max_file_size(),
            download_timeout: default_download_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BypassConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bypass_methods")]
    pub methods: Vec<String>,
    #[serde(default = "default_fallback_delay")]
    pub fallback_delay: u64,
    #[serde(default, rename = "headless_browser")]
    pub headless_browser: bool,
}

impl Default for BypassConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            methods: default_bypass_methods(),
            fallback_delay: default_fallback_delay(),
            headless_browser: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_solver_urls() -> Vec<String> {
    vec!["http://localhost:8191".to_string()]
}

fn default_solver_port() -> u16 {
    8191
}

fn default_solver_max_timeout() -> u64 {
    60_000
}

fn default_session_id() -> String {
    "web2video_session".to_string()
}

fn default_timeout() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2_000
}

fn default_normal_retries() -> u32 {
    1
}

fn default_solver_retries() -> u32 {
    2
}

fn default_bypass_retries() -> u32 {
    2
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/121.0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_server_port() -> u16 {
    3000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_video_extensions() -> Vec<String> {
    [
        ".mp4", ".webm", ".ogg", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".m4v",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_image_extensions() -> Vec<String> {
    [
        ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".ico", ".tiff", ".tif",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_file_size() -> String {
    "500MB".to_string()
}

fn default_download_timeout() -> u64 {
    300_000
}

fn default_bypass_methods() -> Vec<String> {
    ["headers", "useragent", "referer", "flaresolverr"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_fallback_delay() -> u64 {
    5_000
}

impl Config {
    /// Load configuration, discovering the file via prefer and falling back
    /// to `config.yml` in the working directory, then to defaults.
    pub async fn load() -> Self {
        if let Ok(pref_config) = prefer::load(CONFIG_NAME).await {
            if let Some(path) = pref_config.source_path() {
                return Self::load_or_default(path).await;
            }
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load_or_default(&local).await;
        }

        tracing::warn!("{} not found, using default configuration", DEFAULT_CONFIG_FILE);
        Self::default_with_env()
    }

    /// Load from an explicit path, logging and falling back to defaults on error.
    pub async fn load_or_default(path: &Path) -> Self {
        match Self::load_from_path(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("{}", e);
                tracing::warn!("Using default configuration");
                Self::default_with_env()
            }
        }
    }

    /// Defaults with environment overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports YAML, TOML, and JSON based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Parse config text, choosing the format from the path's extension.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yml");
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_err(e.to_string())),
            "json" => serde_json::from_str(contents).map_err(|e| parse_err(e.to_string())),
            _ => serde_yaml::from_str(contents).map_err(|e| parse_err(e.to_string())),
        }
    }

    /// Apply `PORT` and `FLARESOLVERR_URL` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(urls) = std::env::var("FLARESOLVERR_URL") {
            let urls: Vec<String> = urls
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !urls.is_empty() {
                self.flaresolverr.urls = urls;
                self.flaresolverr.enabled = true;
            }
        }
        self
    }

    /// Build the immutable retrieval snapshot consumed by the orchestrator.
    pub fn retrieval(&self) -> RetrievalConfig {
        RetrievalConfig::from_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_defaults() {
        let config = Config::default();
        assert!(!config.flaresolverr.enabled);
        assert_eq!(config.flaresolverr.urls, vec!["http://localhost:8191"]);
        assert_eq!(config.flaresolverr.max_timeout, 60_000);
        assert_eq!(config.requests.normal_retries, 1);
        assert_eq!(config.requests.flaresolverr_retries, 2);
        assert_eq!(config.requests.bypass_retries, 2);
        assert_eq!(config.requests.user_agents.len(), 4);
        assert_eq!(config.video.extensions.len(), 9);
        assert!(config.bypass.enabled);
        assert_eq!(config.bypass.fallback_delay, 5_000);
    }

    #[test]
    fn test_parse_partial_yaml_keeps_defaults() {
        let yaml = r#"
requests:
  normalRetries: 3
  retryDelay: 10
bypass:
  enabled: false
"#;
        let config = Config::parse(yaml, Path::new("config.yml")).unwrap();
        assert_eq!(config.requests.normal_retries, 3);
        assert_eq!(config.requests.retry_delay, 10);
        assert_eq!(config.requests.timeout, 30_000);
        assert!(!config.bypass.enabled);
        assert_eq!(config.bypass.methods.len(), 4);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_parse_legacy_solver_url() {
        let yaml = r#"
flaresolverr:
  enabled: true
  url: "http://solver:8191"
"#;
        let config = Config::parse(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(config.flaresolverr.urls, vec!["http://solver:8191"]);
    }

    #[test]
    fn test_parse_legacy_url_does_not_override_explicit_urls() {
        let yaml = r#"
flaresolverr:
  url: "http://legacy:8191"
  urls: ["http://a:8191", "http://b:8191"]
"#;
        let config = Config::parse(yaml, Path::new("config.yml")).unwrap();
        assert_eq!(config.flaresolverr.urls, vec!["http://a:8191", "http://b:8191"]);
    }

    #[test]
    fn test_parse_legacy_url_keeps_explicit_default_urls() {
        let yaml = r#"
flaresolverr:
  url: "http://legacy:8191"
  urls: ["http://localhost:8191"]
"#;
        let config = Config::parse(yaml, Path::new("config.yml")).unwrap();
        assert_eq!(config.flaresolverr.urls, vec!["http://localhost:8191"]);
    }

    #[test]
    fn test_parse_headless_browser_key() {
        let yaml = "bypass:\n  headless_browser: true\n";
        let config = Config::parse(yaml, Path::new("config.yml")).unwrap();
        assert!(config.bypass.headless_browser);
    }

    #[test]
    fn test_parse_json_and_toml() {
        let json = r#"{"requests": {"bypassRetries": 5}}"#;
        let config = Config::parse(json, Path::new("web2video.json")).unwrap();
        assert_eq!(config.requests.bypass_retries, 5);

        let toml = "[server]\nport = 8080\n";
        let config = Config::parse(toml, Path::new("web2video.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_parse_invalid_yaml_is_error() {
        let err = Config::parse("requests: [1, 2", Path::new("config.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_load_from_path_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "video:\n  extensions: ['.mp4']\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.video.extensions, vec![".mp4"]);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.yml")).await;
        assert_eq!(config.requests.normal_retries, 1);
        assert!(config.source_path.is_none());
    }
}
