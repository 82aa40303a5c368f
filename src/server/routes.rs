//! Router configuration for the web server.

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::handlers;
use super::AppState;
use crate::config::CorsConfig;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = state.config.snapshot().server.cors.clone();

    let router = Router::new()
        .route("/api/fetch-videos", post(handlers::fetch_videos))
        .route("/api/video-metadata", get(handlers::video_metadata))
        .route("/api/health", get(handlers::health));

    let router = match cors_layer(&cors) {
        Some(layer) => router.layer(layer),
        None => router,
    };

    router.with_state(state)
}

/// CORS policy from config; `None` when disabled.
fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }

    let origin = if config.origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::ORIGIN,
                HeaderName::from_static("x-requested-with"),
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::AUTHORIZATION,
            ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_disabled() {
        let config = CorsConfig {
            enabled: false,
            origins: vec!["*".to_string()],
        };
        assert!(cors_layer(&config).is_none());
    }

    #[test]
    fn test_cors_explicit_origins() {
        let config = CorsConfig {
            enabled: true,
            origins: vec!["https://app.test".to_string(), "bad\norigin".to_string()],
        };
        assert!(cors_layer(&config).is_some());
    }
}
