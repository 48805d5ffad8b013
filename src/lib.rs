//! Creeper: a resumable single-host web crawler
//!
//! This crate implements the crawl-state core of the crawler: URL
//! normalization, scope filtering, content deduplication, the visited /
//! unvisited frontier, resource classification and download routing, and a
//! session directory that lets an interrupted crawl resume where it stopped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod resource;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Creeper operations
#[derive(Debug, Error)]
pub enum CreeperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("A session already exists in {0} (resume it or pass --clear)")]
    SessionExists(String),

    #[error("No session found in {0}")]
    SessionNotFound(String),
}

/// Per-URL crawl failures
///
/// None of these abort a session. Host and fetch failures permanently mark
/// the URL visited with an opaque marker; the rest are logged and skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrawlError {
    #[error("Host unresolvable for {url}: {reason}")]
    HostUnresolvable { url: String, reason: String },

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Render failed for {url}: {reason}")]
    RenderFailed { url: String, reason: String },

    #[error("Indexing failed for {url}: {reason}")]
    IndexingFailed { url: String, reason: String },

    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Corrupt result buffer line {line}: {reason}")]
    BufferParseError { line: usize, reason: String },
}

impl CrawlError {
    /// Returns true if the URL must be recorded visited with an error marker
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::HostUnresolvable { .. } | Self::FetchFailed { .. }
        )
    }
}

/// Result type alias for Creeper operations
pub type Result<T> = std::result::Result<T, CreeperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::SessionConfig;
pub use crawler::{Coordinator, CrawlOutcome};
pub use output::CrawlResult;
pub use resource::{classify, ResourceCategory};
pub use state::{ContentFingerprint, CrawlPhase, Frontier, Session, VisitMark};
pub use url::{normalize_url, ScopePolicy};
