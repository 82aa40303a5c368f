//! Challenge-solver proxy wire protocol (FlareSolverr compatible).
//!
//! Requests are `POST <endpoint>/v1` with a JSON command; a successful
//! envelope carries the solved page under `solution`.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::identity::HeaderSet;
use super::response::RawResponse;
use crate::config::SolverSettings;
use crate::error::TierError;

const SOLVE_COMMAND: &str = "request.get";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest<'a> {
    pub cmd: &'static str,
    pub url: &'a str,
    pub max_timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<&'a HeaderSet>,
}

#[derive(Debug, Deserialize)]
pub struct SolveEnvelope {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub solution: Option<Solution>,
}

#[derive(Debug, Deserialize)]
pub struct Solution {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, serde_json::Value>,
}

impl SolveEnvelope {
    /// Unwrap the envelope into the target's response.
    pub fn into_response(self) -> Result<RawResponse, TierError> {
        if self.status != "ok" {
            return Err(TierError::SolverProtocol(
                self.message.unwrap_or_else(|| format!("status '{}'", self.status)),
            ));
        }

        let solution = self.solution.ok_or_else(|| {
            TierError::SolverProtocol("ok envelope without a solution".to_string())
        })?;

        let headers = solution
            .headers
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect();

        Ok(RawResponse::new(
            solution.status,
            headers,
            solution.response.into_bytes(),
        ))
    }
}

/// `<endpoint>/v1`, tolerating a trailing slash on the endpoint.
pub fn solve_url(endpoint: &str) -> String {
    format!("{}/v1", endpoint.trim_end_matches('/'))
}

/// Ask one solver endpoint to fetch `url`.
pub async fn solve(
    client: &Client,
    endpoint: &str,
    settings: &SolverSettings,
    url: &str,
    headers: &HeaderSet,
) -> Result<RawResponse, TierError> {
    let request = SolveRequest {
        cmd: SOLVE_COMMAND,
        url,
        max_timeout: settings.max_timeout.as_millis() as u64,
        session: settings.session.as_deref(),
        headers: (!headers.is_empty()).then_some(headers),
    };

    let response = client
        .post(solve_url(endpoint))
        .timeout(settings.request_timeout())
        .json(&request)
        .send()
        .await
        .map_err(|e| TierError::Transport(format!("FlareSolverr request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| TierError::Transport(format!("FlareSolverr request failed: {}", e)))?;

    match serde_json::from_slice::<SolveEnvelope>(&body) {
        Ok(envelope) => envelope.into_response(),
        Err(_) if !status.is_success() => Err(TierError::Transport(format!(
            "FlareSolverr request failed with status code {}",
            status.as_u16()
        ))),
        Err(e) => Err(TierError::SolverProtocol(format!(
            "malformed solver response: {}",
            e
        ))),
    }
}
