//! Offline extraction from a saved page.

use std::path::Path;

use anyhow::Context;

use crate::cli::output::{print_videos, print_videos_json};
use crate::config::Config;
use crate::extract::{extract, ExtractOptions};

pub async fn cmd_extract(config: &Config, file: &Path, base: &str, json: bool) -> anyhow::Result<()> {
    let html = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let videos = extract(&html, base, &ExtractOptions::from(&config.video));

    if json {
        print_videos_json(base, &videos)
    } else {
        print_videos(base, &videos);
        Ok(())
    }
}
