use crate::state::ContentFingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One response in a redirect chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectHop {
    pub url: String,
    #[serde(rename = "status")]
    pub status_code: u16,
}

/// Structured output of successfully crawling one URL
///
/// Appended to `session_buffer.ndjson` as soon as it is complete and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Normalized URL the content is recorded under
    pub url: String,

    /// HTTP status the requested URL answered with
    #[serde(rename = "status")]
    pub status_code: u16,

    /// Fingerprint of the extracted text
    #[serde(rename = "sha256")]
    pub fingerprint: ContentFingerprint,

    #[serde(rename = "content-type", default)]
    pub content_type: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Extracted, whitespace-collapsed text
    pub text: String,

    /// Outbound links, normalized, in document order
    #[serde(default)]
    pub links: Vec<String>,

    /// Redirects followed before the final response
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirects: Vec<RedirectHop>,

    #[serde(rename = "crawled-at")]
    pub crawled_at: DateTime<Utc>,
}

impl CrawlResult {
    /// Serializes the result as one NDJSON line (without the newline)
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}
