//! Dynamic rendering collaborator
//!
//! In dynamic mode every fetched page is requested again through a
//! prerender-style service that executes its JavaScript. A rendering
//! failure is logged and the statically fetched body is used instead.

use crate::crawler::fetcher::USER_AGENT;
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Rendering executes page scripts, so it gets a longer timeout than fetching
pub const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the client used to talk to the rendering service
pub fn build_render_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(RENDER_TIMEOUT)
        .build()
}

/// Renders a URL to its post-JavaScript HTML
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, CrawlError>;

    /// Releases any held resources; called once when the run ends
    async fn release(&self) {}
}

/// Renderer backed by a prerender-style HTTP service (`GET {endpoint}/{url}`)
#[derive(Debug, Clone)]
pub struct PrerenderRenderer {
    client: Client,
    endpoint: String,
}

impl PrerenderRenderer {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn render_url(&self, url: &str) -> String {
        format!("{}/{}", self.endpoint, url)
    }
}

#[async_trait]
impl Renderer for PrerenderRenderer {
    async fn render(&self, url: &str) -> Result<String, CrawlError> {
        let failed = |reason: String| CrawlError::RenderFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(self.render_url(url))
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("render service answered {}", status)));
        }

        response.text().await.map_err(|e| failed(e.to_string()))
    }

    async fn release(&self) {
        tracing::debug!("Released renderer at {}", self.endpoint);
    }
}
