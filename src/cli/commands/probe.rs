//! Probe command.

use std::sync::Arc;

use crate::config::Config;
use crate::probe::MetadataProbe;
use crate::retrieval::RetrievalOrchestrator;

/// Print size and format of a video URL as JSON.
pub async fn cmd_probe(config: &Config, url: &str) -> anyhow::Result<()> {
    let orchestrator = RetrievalOrchestrator::new(Arc::new(config.retrieval()))?;
    let metadata = MetadataProbe::new(orchestrator).probe(url).await;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
