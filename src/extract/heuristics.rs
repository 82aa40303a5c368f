//! Independent detection heuristics.
//!
//! Each heuristic reads the document (or raw HTML) on its own and returns
//! candidates in document order. Merging and deduplication happen in the
//! caller.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::urls::{has_extension, host_matches, is_excluded, resolve_url};
use super::{ExtractOptions, VideoKind, VideoReference};
use crate::error::ExtractionWarning;

/// Hosts whose embed frames are reported as videos.
pub const EMBED_HOSTS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "twitch.tv",
    "streamable.com",
];

fn selector(css: &str) -> Result<Selector, ExtractionWarning> {
    Selector::parse(css).map_err(|e| ExtractionWarning::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn attr(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_attr(element: &ElementRef<'_>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| attr(element, name))
}

fn media_title(element: &ElementRef<'_>) -> Option<String> {
    first_attr(element, &["title", "alt", "data-title"])
}

/// `<video>` elements: direct `src`, every nested `<source>`, and lazy-load
/// attributes when neither exists.
pub fn media_tags(
    doc: &Html,
    base_url: &str,
    options: &ExtractOptions,
) -> Result<Vec<VideoReference>, ExtractionWarning> {
    let videos = selector("video")?;
    let sources = selector("source")?;
    let images = &options.image_extensions;
    let mut found = Vec::new();

    for video in doc.select(&videos) {
        let title = media_title(&video);
        let direct = attr(&video, "src");

        if let Some(src) = direct.as_deref().filter(|s| !has_extension(s, images)) {
            let mut reference = VideoReference::new(resolve_url(src, base_url), VideoKind::VideoTag);
            reference.poster = attr(&video, "poster").map(|p| resolve_url(&p, base_url));
            reference.title = title.clone();
            reference.duration = attr(&video, "duration");
            found.push(reference);
        }

        let mut has_sources = false;
        for source in video.select(&sources) {
            has_sources = true;
            let Some(src) = attr(&source, "src") else {
                continue;
            };
            if has_extension(&src, images) {
                continue;
            }
            let mut reference =
                VideoReference::new(resolve_url(&src, base_url), VideoKind::SourceTag);
            reference.quality = first_attr(&source, &["label", "data-quality", "size"]);
            reference.format = attr(&source, "type")
                .and_then(|t| t.split('/').nth(1).map(str::to_string))
                .filter(|f| !f.is_empty());
            reference.title = title.clone();
            found.push(reference);
        }

        if direct.is_none() && !has_sources {
            if let Some(src) = first_attr(&video, &["data-src", "data-video-src"]) {
                if !has_extension(&src, images) {
                    let mut reference =
                        VideoReference::new(resolve_url(&src, base_url), VideoKind::DataAttribute);
                    reference.title = title;
                    found.push(reference);
                }
            }
        }
    }

    Ok(found)
}

/// `<a href>` targets that mention a video extension.
pub fn anchors(
    doc: &Html,
    base_url: &str,
    options: &ExtractOptions,
) -> Result<Vec<VideoReference>, ExtractionWarning> {
    let links = selector("a[href]")?;

    Ok(doc
        .select(&links)
        .filter_map(|link| {
            let href = attr(&link, "href")?;
            if !has_extension(&href, &options.extensions)
                || is_excluded(&href, &options.image_extensions)
            {
                return None;
            }
            let mut reference = VideoReference::new(resolve_url(&href, base_url), VideoKind::Link);
            let text = link.text().collect::<String>();
            let text = text.trim();
            reference.text = (!text.is_empty()).then(|| text.to_string());
            reference.title = attr(&link, "title");
            Some(reference)
        })
        .collect())
}

/// Pattern matching absolute http(s) URLs that end in one of `extensions`,
/// optionally followed by a query string.
pub fn video_url_pattern(extensions: &[String]) -> Result<Option<Regex>, ExtractionWarning> {
    let escaped: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return Ok(None);
    }

    let pattern = format!(
        r#"(?i)https?://[^\s"'<>]+\.(?:{})(?:\?[^\s"'<>]*)?"#,
        escaped.join("|")
    );
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| ExtractionWarning::Pattern(e.to_string()))
}

/// Absolute video URLs anywhere in the raw HTML, including scripts.
pub fn raw_text(
    html: &str,
    base_url: &str,
    options: &ExtractOptions,
) -> Result<Vec<VideoReference>, ExtractionWarning> {
    let Some(pattern) = video_url_pattern(&options.extensions)? else {
        return Ok(Vec::new());
    };

    Ok(pattern
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|url| !is_excluded(url, &options.image_extensions))
        .map(|url| VideoReference::new(resolve_url(url, base_url), VideoKind::RegexMatch))
        .collect())
}

/// `<iframe src>` embeds hosted on a known video platform.
pub fn iframes(doc: &Html, base_url: &str) -> Result<Vec<VideoReference>, ExtractionWarning> {
    let frames = selector("iframe[src]")?;

    Ok(doc
        .select(&frames)
        .filter_map(|frame| {
            let resolved = resolve_url(&attr(&frame, "src")?, base_url);
            if !host_matches(&resolved, EMBED_HOSTS) {
                return None;
            }
            let mut reference = VideoReference::new(resolved, VideoKind::Iframe);
            reference.title = attr(&frame, "title");
            Some(reference)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://x.test/page/";

    fn options() -> ExtractOptions {
        ExtractOptions::default()
    }

    #[test]
    fn test_media_tags_collect_direct_and_sources() {
        let doc = Html::parse_document(
            r#"<video src="a.mp4" poster="p.jpg" title="Clip" duration="12">
                 <source src="a_720.webm" type="video/webm" data-quality="720p">
                 <source src="thumb.png">
               </video>"#,
        );
        let found = media_tags(&doc, BASE, &options()).unwrap();
        assert_eq!(found.len(), 2);

        assert_eq!(found[0].url, "https://x.test/page/a.mp4");
        assert_eq!(found[0].kind, VideoKind::VideoTag);
        assert_eq!(found[0].poster.as_deref(), Some("https://x.test/page/p.jpg"));
        assert_eq!(found[0].duration.as_deref(), Some("12"));

        assert_eq!(found[1].kind, VideoKind::SourceTag);
        assert_eq!(found[1].quality.as_deref(), Some("720p"));
        assert_eq!(found[1].format.as_deref(), Some("webm"));
        assert_eq!(found[1].title.as_deref(), Some("Clip"));
    }

    #[test]
    fn test_media_tags_lazy_attributes_only_without_sources() {
        let doc = Html::parse_document(
            r#"<video data-src="/lazy.mp4" alt="Lazy"></video>
               <video data-src="/ignored.mp4"><source src="/real.mp4"></video>"#,
        );
        let found = media_tags(&doc, BASE, &options()).unwrap();
        let urls: Vec<&str> = found.iter().map(|v| v.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.test/lazy.mp4", "https://x.test/real.mp4"]);
        assert_eq!(found[0].kind, VideoKind::DataAttribute);
        assert_eq!(found[0].title.as_deref(), Some("Lazy"));
    }

    #[test]
    fn test_media_tags_skip_image_src() {
        let doc = Html::parse_document(r#"<video src="cover.jpg" data-video-src="v.mp4"></video>"#);
        let found = media_tags(&doc, BASE, &options()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_anchors_filter_and_capture_text() {
        let doc = Html::parse_document(
            r#"<a href="/dl/movie.MKV" title="Download">  Get it </a>
               <a href="/favicon.mp4">x</a>
               <a href="/poster.mp4.jpg">x</a>
               <a href="/about.html">x</a>"#,
        );
        let found = anchors(&doc, BASE, &options()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://x.test/dl/movie.MKV");
        assert_eq!(found[0].text.as_deref(), Some("Get it"));
        assert_eq!(found[0].title.as_deref(), Some("Download"));
    }

    #[test]
    fn test_raw_text_finds_script_urls() {
        let html = r#"<script>var v = "https://cdn.test/v/clip.webm?token=1"; var i = 'https://cdn.test/favicon.mp4';</script>"#;
        let found = raw_text(html, BASE, &options()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://cdn.test/v/clip.webm?token=1");
        assert_eq!(found[0].kind, VideoKind::RegexMatch);
    }

    #[test]
    fn test_pattern_escapes_extensions() {
        let exts = vec![".m+4".to_string()];
        let pattern = video_url_pattern(&exts).unwrap().unwrap();
        assert!(pattern.is_match("https://x.test/a.m+4"));
        assert!(!pattern.is_match("https://x.test/a.mm4"));
        assert!(video_url_pattern(&[]).unwrap().is_none());
    }

    #[test]
    fn test_iframes_allowlist() {
        let doc = Html::parse_document(
            r#"<iframe src="https://www.youtube.com/embed/abc" title="YT"></iframe>
               <iframe src="//player.vimeo.com/video/1"></iframe>
               <iframe src="https://ads.test/frame"></iframe>"#,
        );
        let found = iframes(&doc, BASE).unwrap();
        let urls: Vec<&str> = found.iter().map(|v| v.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/embed/abc",
                "https://player.vimeo.com/video/1"
            ]
        );
        assert_eq!(found[0].title.as_deref(), Some("YT"));
    }
}
