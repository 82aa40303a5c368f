//! API endpoint handlers.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;

use super::AppState;
use crate::extract::{extract, ExtractOptions};
use crate::probe::MetadataProbe;
use crate::retrieval::FetchOptions;

#[derive(Debug, Deserialize)]
pub struct FetchVideosRequest {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataParams {
    pub url: Option<String>,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Validate a user-supplied target, adding `https://` when no scheme is given.
pub fn normalize_target(raw: &str) -> Result<String, &'static str> {
    let url = raw.trim();
    if url.is_empty() {
        return Err("URL is required");
    }
    if url.starts_with('/') {
        return Err("Please provide a full URL with domain");
    }
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Ok(format!("https://{}", url))
    }
}

/// Fetch a page through the bypass tiers and list its video references.
pub async fn fetch_videos(State(state): State<AppState>, body: Bytes) -> Response {
    let raw = serde_json::from_slice::<FetchVideosRequest>(&body)
        .ok()
        .and_then(|req| req.url)
        .unwrap_or_default();

    let url = match normalize_target(&raw) {
        Ok(url) => url,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    tracing::info!("Fetching: {}", url);

    let snapshot = state.config.snapshot();
    let orchestrator = match AppState::orchestrator(&snapshot) {
        Ok(o) => o,
        Err(e) => {
            tracing::error!("Invalid retrieval configuration: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
                .into_response();
        }
    };

    match orchestrator
        .fetch(&url, &FetchOptions::default())
        .await
        .into_result()
    {
        Ok(response) => {
            let videos = extract(
                &response.text(),
                &url,
                &ExtractOptions::from(&snapshot.video),
            );
            Json(serde_json::json!({
                "success": true,
                "url": url,
                "count": videos.len(),
                "videos": videos,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!("Error fetching videos: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                    "attempts": e.attempts(),
                })),
            )
                .into_response()
        }
    }
}

/// Probe size and container format of a single video URL.
pub async fn video_metadata(
    State(state): State<AppState>,
    Query(params): Query<MetadataParams>,
) -> Response {
    let Some(url) = params.url.filter(|u| !u.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "URL parameter is required");
    };

    match AppState::orchestrator(&state.config.snapshot()) {
        Ok(orchestrator) => {
            let metadata = MetadataProbe::new(orchestrator).probe(&url).await;
            Json(serde_json::json!({ "success": true, "metadata": metadata })).into_response()
        }
        Err(e) => {
            tracing::error!("Metadata error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get video metadata",
            )
        }
    }
}

/// Health check with enabled features.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.config.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "config": {
            "flaresolverr": config.flaresolverr.enabled,
            "proxy": config.proxy.enabled,
            "bypass": config.bypass.enabled,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target(""), Err("URL is required"));
        assert_eq!(normalize_target("   "), Err("URL is required"));
        assert_eq!(
            normalize_target("/watch"),
            Err("Please provide a full URL with domain")
        );
        assert_eq!(
            normalize_target("example.com/v").as_deref(),
            Ok("https://example.com/v")
        );
        assert_eq!(
            normalize_target("HTTP://example.com").as_deref(),
            Ok("HTTP://example.com")
        );
    }
}
