//! Response wrapper shared by all bypass tiers.

use std::borrow::Cow;
use std::collections::BTreeMap;

use reqwest::Response;
use serde::Serialize;

/// A fully-read response from the target (directly or through the solver).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawResponse {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Read status, headers, and body from a reqwest response.
    pub async fn read(response: Response) -> Result<Self, reqwest::Error> {
        let status = response.status().as_u16();
        let headers = extract_response_headers(&response);
        let body = response.bytes().await?.to_vec();
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Get the Content-Length header.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get("content-length")
            .and_then(|s| s.trim().parse().ok())
    }
}

fn extract_response_headers(response: &Response) -> BTreeMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lowercases_header_names() {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "video/mp4".to_string());
        headers.insert("Content-Length".to_string(), " 2048 ".to_string());
        let response = RawResponse::new(200, headers, Vec::new());

        assert_eq!(response.content_type(), Some("video/mp4"));
        assert_eq!(response.content_length(), Some(2048));
    }

    #[test]
    fn test_text_is_lossy() {
        let response = RawResponse::new(200, BTreeMap::new(), vec![b'o', b'k', 0xff]);
        assert_eq!(response.text(), "ok\u{fffd}");
    }
}
