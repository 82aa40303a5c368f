//! Fetch command.

use std::sync::Arc;

use crate::cli::output::{print_retrieval_failure, print_videos, print_videos_json};
use crate::config::Config;
use crate::extract::{extract, ExtractOptions};
use crate::retrieval::{FetchOptions, RetrievalOrchestrator};

/// Fetch a page through the bypass tiers and list its videos.
pub async fn cmd_fetch(config: &Config, url: &str, json: bool) -> anyhow::Result<()> {
    let orchestrator = RetrievalOrchestrator::new(Arc::new(config.retrieval()))?;

    let response = match orchestrator
        .fetch(url, &FetchOptions::default())
        .await
        .into_result()
    {
        Ok(response) => response,
        Err(e) => {
            print_retrieval_failure(url, &e);
            return Err(e.into());
        }
    };

    let videos = extract(
        &response.text(),
        url,
        &ExtractOptions::from(&config.video),
    );

    if json {
        print_videos_json(url, &videos)
    } else {
        print_videos(url, &videos);
        Ok(())
    }
}
