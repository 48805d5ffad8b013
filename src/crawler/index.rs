//! Search-index collaborator

use crate::output::CrawlResult;
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::Client;
use url::form_urlencoded;

/// Name of the index results are written to
pub const INDEX_NAME: &str = "creeper";

/// Receives every crawl result
#[async_trait]
pub trait Indexer: Send + Sync {
    async fn index(&self, result: &CrawlResult) -> Result<(), CrawlError>;
}

/// Indexes results into Elasticsearch, one document per URL
///
/// The document id is the URL, so re-indexing a page replaces it.
#[derive(Debug, Clone)]
pub struct ElasticsearchIndexer {
    client: Client,
    endpoint: String,
}

impl ElasticsearchIndexer {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn document_url(&self, url: &str) -> String {
        let id: String = form_urlencoded::byte_serialize(url.as_bytes()).collect();
        format!("{}/{}/_doc/{}", self.endpoint, INDEX_NAME, id)
    }
}

#[async_trait]
impl Indexer for ElasticsearchIndexer {
    async fn index(&self, result: &CrawlResult) -> Result<(), CrawlError> {
        let failed = |reason: String| CrawlError::IndexingFailed {
            url: result.url.clone(),
            reason,
        };

        let response = self
            .client
            .put(self.document_url(&result.url))
            .json(result)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("{}: {}", status, body)));
        }

        tracing::trace!("Indexed {}", result.url);
        Ok(())
    }
}
