//! Error types for configuration, bypass tiers, and retrieval.

use std::path::PathBuf;

use thiserror::Error;

use crate::retrieval::AttemptRecord;

/// Invalid or unusable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("user agent pool is empty")]
    EmptyUserAgentPool,
    #[error("challenge solver is enabled but no endpoints are configured")]
    NoSolverEndpoints,
    #[error("invalid proxy '{0}'")]
    InvalidProxy(String),
    #[error("failed to create HTTP client: {0}")]
    Client(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failure of a single attempt within one bypass tier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierError {
    /// Network or timeout failure before a usable response arrived.
    #[error("{0}")]
    Transport(String),
    /// The target answered but refused the request.
    #[error("Request blocked with status {status}")]
    Blocked { status: u16 },
    /// The target answered with a status this tier cannot use.
    #[error("Request failed with status code {status}")]
    Rejected { status: u16 },
    /// The challenge solver envelope reported a non-"ok" status.
    #[error("FlareSolverr error: {0}")]
    SolverProtocol(String),
    #[error("{0} bypass not implemented yet")]
    Unimplemented(String),
}

impl TierError {
    /// True when the target signaled a block rather than a transport problem.
    pub fn is_block(&self) -> bool {
        matches!(self, TierError::Blocked { .. })
    }
}

impl From<reqwest::Error> for TierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TierError::Transport(format!("timeout: {}", err))
        } else {
            TierError::Transport(err.to_string())
        }
    }
}

/// Every configured tier was exhausted.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("All fetch methods failed: {}", join_attempts(.attempts))]
    Exhausted { attempts: Vec<AttemptRecord> },
}

impl RetrievalError {
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            RetrievalError::Exhausted { attempts } => attempts,
        }
    }
}

/// A single extraction heuristic could not run. Logged, never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionWarning {
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
    #[error("invalid video URL pattern: {0}")]
    Pattern(String),
}

fn join_attempts(attempts: &[AttemptRecord]) -> String {
    if attempts.is_empty() {
        return "no tiers were attempted".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
