//! HTTP fetcher
//!
//! This module handles all network access for the crawler:
//! - Host resolution before a page is requested
//! - GET requests for pages and downloadable resources
//! - Manual redirect handling (max 10 hops, loop detection)
//!
//! No request is retried. Any HTTP status is a successful fetch; only
//! transport failures and broken redirect chains are errors.

use crate::output::RedirectHop;
use crate::url::normalize_url;
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Response};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Browser-like User-Agent sent with every request
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum redirects followed before the fetch fails
pub const MAX_REDIRECTS: usize = 10;

/// A fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL that was requested
    pub requested_url: String,

    /// Normalized URL of the final response
    pub final_url: String,

    /// Status of the first response in the chain
    pub status_code: u16,

    /// Status of the final response
    pub final_status: u16,

    /// Content-Type header of the final response
    pub content_type: Option<String>,

    /// Response body
    pub body: String,

    /// Redirect responses in order, excluding the final response
    pub redirects: Vec<RedirectHop>,
}

impl FetchedPage {
    /// Returns true if at least one redirect was followed
    pub fn was_redirected(&self) -> bool {
        !self.redirects.is_empty()
    }
}

/// Network access used by the orchestrator and the download router
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Checks that the URL's host resolves
    async fn resolve(&self, url: &str) -> Result<(), CrawlError>;

    /// Fetches a page, following redirects
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, CrawlError>;

    /// Fetches a resource body; non-success statuses are errors
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, CrawlError>;
}

/// Builds the HTTP client shared by every collaborator
///
/// Redirects are disabled so the fetcher can record each hop.
///
/// # Example
///
/// ```no_run
/// use creeper::crawler::build_http_client;
///
/// let client = build_http_client().unwrap();
/// ```
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Fetcher` backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Sends GET requests until a non-redirect response arrives
    async fn follow(&self, url: &str) -> Result<(Response, Vec<RedirectHop>), CrawlError> {
        let failed = |reason: String| CrawlError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        let mut current = Url::parse(url).map_err(|e| failed(e.to_string()))?;
        let mut hops = Vec::new();
        let mut seen = HashSet::new();

        loop {
            if !seen.insert(current.to_string()) {
                return Err(failed(format!("redirect loop at {}", current)));
            }

            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| failed(e.to_string()))?;

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let Some(location) = location.filter(|_| status.is_redirection()) else {
                return Ok((response, hops));
            };

            if hops.len() >= MAX_REDIRECTS {
                return Err(failed(format!("more than {} redirects", MAX_REDIRECTS)));
            }

            let next = current
                .join(&location)
                .map_err(|e| failed(format!("bad redirect target '{}': {}", location, e)))?;

            tracing::debug!("\tredir: {} {}", status.as_u16(), current);
            hops.push(RedirectHop {
                url: normalize_url(current.as_str()),
                status_code: status.as_u16(),
            });
            current = next;
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn resolve(&self, url: &str) -> Result<(), CrawlError> {
        let unresolvable = |reason: String| CrawlError::HostUnresolvable {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url).map_err(|e| unresolvable(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| unresolvable("no host".to_string()))?;
        let port = parsed.port_or_known_default().unwrap_or(80);

        let mut addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| unresolvable(e.to_string()))?;

        if addrs.next().is_none() {
            return Err(unresolvable("no addresses".to_string()));
        }

        Ok(())
    }

    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        let (response, redirects) = self.follow(url).await?;

        let final_url = normalize_url(response.url().as_str());
        let final_status = response.status().as_u16();
        let status_code = redirects
            .first()
            .map(|hop| hop.status_code)
            .unwrap_or(final_status);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| CrawlError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(FetchedPage {
            requested_url: url.to_string(),
            final_url,
            status_code,
            final_status,
            content_type,
            body,
            redirects,
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
        let (response, _) = self.follow(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| CrawlError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}
