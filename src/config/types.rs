use crate::resource::ResourceCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Rendering service used when dynamic mode is enabled without an endpoint
pub const DEFAULT_RENDER_ENDPOINT: &str = "http://localhost:3000";

/// Session configuration, written once to `config.json` when a session is
/// created and read back unchanged on resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seed URL the session starts from; anchors scope decisions
    pub seed: String,

    /// Follow links outside the seed's host
    #[serde(default)]
    pub follow: bool,

    /// Only follow links below the seed URL
    #[serde(rename = "preserve-path", default)]
    pub preserve_path: bool,

    /// Per-category download switches
    #[serde(default)]
    pub downloads: DownloadFlags,

    /// Download every recognized resource regardless of category
    #[serde(rename = "all-files", default)]
    pub all_files: bool,

    /// Re-fetch pages through the rendering service
    #[serde(default)]
    pub dynamic: bool,

    /// Address of the prerender-style rendering service
    #[serde(
        rename = "render-endpoint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub render_endpoint: Option<String>,

    /// Address of the search index (http(s)://host:port)
    #[serde(
        rename = "index-endpoint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub index_endpoint: Option<String>,

    /// Session directory
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Logging verbosity (0-3)
    #[serde(default)]
    pub verbosity: u8,

    /// When the session was created
    #[serde(rename = "created-at")]
    pub created_at: DateTime<Utc>,
}

impl SessionConfig {
    /// Creates a configuration with every optional feature disabled
    pub fn new(seed: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            seed: seed.into(),
            follow: false,
            preserve_path: false,
            downloads: DownloadFlags::default(),
            all_files: false,
            dynamic: false,
            render_endpoint: None,
            index_endpoint: None,
            output_dir: output_dir.into(),
            verbosity: 0,
            created_at: Utc::now(),
        }
    }

    /// Session directory used when none is given: `./<host>`, with the
    /// port separator replaced by `_`
    pub fn default_output_dir(seed: &str) -> Option<PathBuf> {
        let url = Url::parse(seed).ok()?;
        let host = url.host_str().filter(|h| !h.is_empty())?;

        let name = match url.port() {
            Some(port) => format!("{}_{}", host, port),
            None => host.to_string(),
        };

        Some(PathBuf::from(".").join(name))
    }
}

/// Download switches, one per resource category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFlags {
    #[serde(default)]
    pub documents: bool,
    #[serde(default)]
    pub images: bool,
    #[serde(default)]
    pub audio: bool,
    #[serde(default)]
    pub video: bool,
}

impl DownloadFlags {
    /// Returns true if any category is switched on
    pub fn any(&self) -> bool {
        self.documents || self.images || self.audio || self.video
    }

    /// Returns true if the category is switched on
    pub fn enabled(&self, category: ResourceCategory) -> bool {
        match category {
            ResourceCategory::Document => self.documents,
            ResourceCategory::Image => self.images,
            ResourceCategory::Audio => self.audio,
            ResourceCategory::Video => self.video,
        }
    }
}
