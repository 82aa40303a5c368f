//! Video reference extraction from HTML documents.
//!
//! Heuristics run in a fixed priority order and their results are merged
//! with first-wins deduplication on the resolved URL, so metadata found by
//! an earlier heuristic is never replaced by a later, poorer match.

pub mod heuristics;
pub mod urls;

use std::collections::HashSet;

use scraper::Html;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::VideoConfig;
use crate::error::ExtractionWarning;

pub use urls::resolve_url;

/// Which heuristic found a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoKind {
    VideoTag,
    SourceTag,
    DataAttribute,
    Link,
    RegexMatch,
    Iframe,
}

impl VideoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoKind::VideoTag => "video-tag",
            VideoKind::SourceTag => "source-tag",
            VideoKind::DataAttribute => "data-attribute",
            VideoKind::Link => "link",
            VideoKind::RegexMatch => "regex-match",
            VideoKind::Iframe => "iframe",
        }
    }
}

/// A candidate video URL with whatever metadata the page offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoReference {
    /// Absolute URL (or the raw string when it could not be resolved).
    pub url: String,
    #[serde(rename = "type")]
    pub kind: VideoKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Anchor text for link references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl VideoReference {
    pub fn new(url: String, kind: VideoKind) -> Self {
        Self {
            url,
            kind,
            poster: None,
            title: None,
            quality: None,
            format: None,
            duration: None,
            text: None,
        }
    }
}

/// Extension lists used for matching and filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub extensions: Vec<String>,
    pub image_extensions: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&VideoConfig::default())
    }
}

impl From<&VideoConfig> for ExtractOptions {
    fn from(config: &VideoConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            image_extensions: config.image_extensions.clone(),
        }
    }
}

/// Extract video references from `html`, resolving relative URLs against `base_url`.
///
/// Never fails: a heuristic that cannot run is logged and skipped.
pub fn extract(html: &str, base_url: &str, options: &ExtractOptions) -> Vec<VideoReference> {
    let doc = Html::parse_document(html);

    let passes: [(&str, Result<Vec<VideoReference>, ExtractionWarning>); 4] = [
        ("media tags", heuristics::media_tags(&doc, base_url, options)),
        ("anchors", heuristics::anchors(&doc, base_url, options)),
        ("raw text", heuristics::raw_text(html, base_url, options)),
        ("iframes", heuristics::iframes(&doc, base_url)),
    ];

    let mut seen = HashSet::new();
    let mut videos = Vec::new();
    for (name, result) in passes {
        match result {
            Ok(found) => {
                debug!("{} heuristic found {} candidate(s)", name, found.len());
                videos.extend(found.into_iter().filter(|v| seen.insert(v.url.clone())));
            }
            Err(warning) => warn!("Skipping {} heuristic: {}", name, warning),
        }
    }

    debug!("Extracted {} video reference(s) from {}", videos.len(), base_url);
    videos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_with_quality_source() {
        let html = r#"<video src="movie.mp4"><source src="movie_hd.mp4" label="HD"></video>"#;
        let videos = extract(html, "https://x.test/", &ExtractOptions::default());

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].url, "https://x.test/movie.mp4");
        assert_eq!(videos[0].kind, VideoKind::VideoTag);
        assert_eq!(videos[1].url, "https://x.test/movie_hd.mp4");
        assert_eq!(videos[1].kind, VideoKind::SourceTag);
        assert_eq!(videos[1].quality.as_deref(), Some("HD"));
    }

    #[test]
    fn test_first_heuristic_wins_on_duplicate() {
        let html = r#"
            <video src="https://cdn.test/a.mp4" title="Rich"></video>
            <a href="https://cdn.test/a.mp4">plain link</a>
            <script>load("https://cdn.test/a.mp4")</script>
        "#;
        let videos = extract(html, "https://x.test/", &ExtractOptions::default());

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].kind, VideoKind::VideoTag);
        assert_eq!(videos[0].title.as_deref(), Some("Rich"));
    }

    #[test]
    fn test_relative_link_dedups_with_absolute_regex_match() {
        let html = r#"<a href="/v/clip.webm">clip</a> https://x.test/v/clip.webm"#;
        let videos = extract(html, "https://x.test/", &ExtractOptions::default());
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].kind, VideoKind::Link);
        assert_eq!(videos[0].text.as_deref(), Some("clip"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let html = r#"
            <video src="a.mp4"><source src="b.webm"></video>
            <a href="c.mkv">c</a>
            <iframe src="https://vimeo.com/1"></iframe>
            "https://cdn.test/d.mov"
        "#;
        let first = extract(html, "https://x.test/", &ExtractOptions::default());
        let second = extract(html, "https://x.test/", &ExtractOptions::default());
        assert_eq!(first, second);

        let kinds: Vec<VideoKind> = first.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VideoKind::VideoTag,
                VideoKind::SourceTag,
                VideoKind::Link,
                VideoKind::RegexMatch,
                VideoKind::Iframe,
            ]
        );
    }

    #[test]
    fn test_favicons_and_images_never_returned() {
        let html = r#"
            <a href="/favicon.ico">icon</a>
            <a href="/favi.mp4">icon</a>
            <a href="/still.mp4.png">still</a>
            https://x.test/favicon-loop.mp4
            https://x.test/preview.jpg?src=clip.webm
        "#;
        let videos = extract(html, "https://x.test/", &ExtractOptions::default());
        assert!(videos.is_empty(), "unexpected: {:?}", videos);
    }

    #[test]
    fn test_serialized_shape() {
        let mut reference =
            VideoReference::new("https://x.test/a.mp4".to_string(), VideoKind::DataAttribute);
        reference.title = Some("A".to_string());
        let value = serde_json::to_value(&reference).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"url": "https://x.test/a.mp4", "type": "data-attribute", "title": "A"})
        );
    }
}
