//! URL helpers shared by the extraction heuristics.

use url::Url;

/// Resolve `raw` against `base`.
///
/// Unparseable input is returned unchanged: a malformed but recognizable
/// string is still useful to the caller.
pub fn resolve_url(raw: &str, base: &str) -> String {
    let raw = raw.trim();
    match Url::parse(base) {
        Ok(base) => match base.join(raw) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => raw.to_string(),
        },
        Err(_) => match Url::parse(raw) {
            Ok(absolute) => absolute.to_string(),
            Err(_) => raw.to_string(),
        },
    }
}

/// Whether `url` mentions any of `extensions` (case-insensitive substring).
pub fn has_extension(url: &str, extensions: &[String]) -> bool {
    let lower = url.to_lowercase();
    extensions
        .iter()
        .any(|ext| !ext.is_empty() && lower.contains(&ext.to_lowercase()))
}

/// Favicon-like URLs (`favicon`, `favi`).
pub fn is_favicon(url: &str) -> bool {
    url.to_lowercase().contains("favi")
}

/// URLs excluded from link and regex results.
pub fn is_excluded(url: &str, image_extensions: &[String]) -> bool {
    is_favicon(url) || has_extension(url, image_extensions)
}

/// Whether the host of `url` is one of `hosts` or a subdomain of one.
pub fn host_matches(url: &str, hosts: &[&str]) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_lowercase();
    hosts
        .iter()
        .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
}
