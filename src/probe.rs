//! Lightweight metadata probe for a single video URL.
//!
//! Reads size and type from a HEAD request, then refines the format by
//! sniffing the first kilobyte of the file.

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::retrieval::{FetchOptions, RetrievalOrchestrator};

pub const HEAD_TIMEOUT: Duration = Duration::from_secs(10);
pub const RANGE_TIMEOUT: Duration = Duration::from_secs(5);
/// Inclusive byte range requested for sniffing.
pub const SNIFF_RANGE: &str = "bytes=0-1024";
const SNIFF_LEN: usize = 1025;

/// Byte markers checked when `infer` does not recognize a video container.
const CONTAINER_MARKERS: &[(&[u8], &str)] = &[(b"ftyp", "mp4"), (b"webm", "webm"), (b"AVI ", "avi")];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl VideoMetadata {
    pub fn bare(url: &str) -> Self {
        Self {
            url: url.to_string(),
            file_size: None,
            format: None,
        }
    }
}

/// Probes video URLs through a retrieval orchestrator.
#[derive(Debug, Clone)]
pub struct MetadataProbe {
    orchestrator: RetrievalOrchestrator,
}

impl MetadataProbe {
    pub fn new(orchestrator: RetrievalOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Probe `url`. A failed HEAD yields only the URL; a failed range request
    /// leaves the HEAD-derived format in place.
    pub async fn probe(&self, url: &str) -> VideoMetadata {
        let head = FetchOptions::default()
            .with_method(Method::HEAD)
            .with_timeout(HEAD_TIMEOUT);

        let response = match self.orchestrator.fetch(url, &head).await.into_result() {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to get metadata for {}: {}", url, e);
                return VideoMetadata::bare(url);
            }
        };

        let mut metadata = VideoMetadata {
            url: url.to_string(),
            file_size: response.content_length(),
            format: response
                .content_type()
                .and_then(content_subtype)
                .or_else(|| path_extension(url)),
        };

        let range = FetchOptions::default()
            .with_header("Range", SNIFF_RANGE)
            .with_timeout(RANGE_TIMEOUT);
        match self.orchestrator.fetch(url, &range).await.into_result() {
            Ok(partial) => {
                if let Some(format) = sniff_format(&partial.body) {
                    metadata.format = Some(format);
                }
            }
            Err(e) => debug!("Range probe failed for {}: {}", url, e),
        }

        metadata
    }
}

/// `video/mp4; codecs=...` → `mp4`.
fn content_subtype(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .next()
        .and_then(|mime| mime.split('/').nth(1))
        .map(|sub| sub.trim().to_string())
        .filter(|sub| !sub.is_empty())
}

fn path_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.last()?.to_string();
    let (_, ext) = last.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_string())
}

/// Container format from leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];

    if let Some(kind) = infer::get(head) {
        if kind.matcher_type() == infer::MatcherType::Video {
            return Some(kind.extension().to_string());
        }
    }

    CONTAINER_MARKERS
        .iter()
        .find(|(marker, _)| contains(head, marker))
        .map(|(_, format)| format.to_string())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
