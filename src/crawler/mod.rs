//! Crawler module for fetching and processing pages
//!
//! This module contains the crawl loop and the collaborators it drives:
//! - HTTP fetching with manual redirect handling
//! - HTML parsing for text, links and resources
//! - Optional dynamic rendering and search indexing
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod index;
mod parser;
mod render;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome, PageOutcome};
pub use fetcher::{
    build_http_client, FetchedPage, Fetcher, ReqwestFetcher, MAX_REDIRECTS, REQUEST_TIMEOUT,
    USER_AGENT,
};
pub use index::{ElasticsearchIndexer, Indexer, INDEX_NAME};
pub use parser::{parse_html, ParsedPage};
pub use render::{build_render_client, PrerenderRenderer, Renderer, RENDER_TIMEOUT};
