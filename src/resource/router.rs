//! Download routing for linked resources
//!
//! Every `<a href>` / `<img src>` reference with a recognized extension is
//! offered to the router. It fetches and stores the resource when the
//! session enables that category (or all files), and skips it otherwise.
//!
//! # File naming
//!
//! A resource is written to `<session>/<category>/<final path segment>`.
//! When that file already exists, the name becomes
//! `<stem>-<first 8 hex digits of SHA-256(url)>.<ext>`, so two different URLs
//! sharing a basename never overwrite each other. A URL is fetched at most
//! once per process.

use crate::config::{DownloadFlags, SessionConfig};
use crate::crawler::Fetcher;
use crate::resource::{classify, ResourceCategory};
use crate::CrawlError;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::PathBuf;
use url::Url;

/// Outcome of routing one page's resource references
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Files written during this call
    pub stored: Vec<PathBuf>,
    /// References not fetched (category disabled, unrecognized, or already fetched)
    pub skipped: usize,
    /// Fetches or writes that failed
    pub failed: usize,
}

/// Decides which resources to fetch and where to store them
#[derive(Debug)]
pub struct DownloadRouter {
    root: PathBuf,
    flags: DownloadFlags,
    all_files: bool,
    fetched: HashSet<String>,
}

impl DownloadRouter {
    /// Creates a router writing below `root`
    pub fn new(root: impl Into<PathBuf>, flags: DownloadFlags, all_files: bool) -> Self {
        Self {
            root: root.into(),
            flags,
            all_files,
            fetched: HashSet::new(),
        }
    }

    /// Creates the router for a session
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.output_dir, config.downloads, config.all_files)
    }

    /// Returns true if any category can be downloaded
    pub fn is_enabled(&self) -> bool {
        self.all_files || self.flags.any()
    }

    /// Returns the category to download the URL under, if it should be fetched
    pub fn route(&self, url: &str) -> Option<ResourceCategory> {
        let category = classify(url)?;

        if self.all_files || self.flags.enabled(category) {
            Some(category)
        } else {
            None
        }
    }

    /// Computes where a resource from `url` will be stored
    pub fn target_path(&self, category: ResourceCategory, url: &str) -> PathBuf {
        let dir = self.root.join(category.dir_name());
        let name = file_name(url);
        let candidate = dir.join(&name);

        if !candidate.exists() {
            return candidate;
        }

        dir.join(suffixed_name(&name, url))
    }

    /// Routes every resource reference found on a page
    ///
    /// Failures are logged and counted; they never interrupt the crawl.
    pub async fn process(&mut self, fetcher: &dyn Fetcher, resources: &[String]) -> DownloadReport {
        let mut report = DownloadReport::default();

        for url in resources {
            let Some(category) = self.route(url) else {
                report.skipped += 1;
                continue;
            };

            if !self.fetched.insert(url.clone()) {
                report.skipped += 1;
                continue;
            }

            match self.download(fetcher, url, category).await {
                Ok(path) => {
                    tracing::info!("\tdownloaded {} -> {}", url, path.display());
                    report.stored.push(path);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Fetches one resource and writes it to its category directory
    async fn download(
        &self,
        fetcher: &dyn Fetcher,
        url: &str,
        category: ResourceCategory,
    ) -> Result<PathBuf, CrawlError> {
        let failed = |reason: String| CrawlError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let bytes = fetcher.fetch_bytes(url).await.map_err(|e| failed(e.to_string()))?;

        let path = self.target_path(category, url);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| failed(e.to_string()))?;
        }

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| failed(e.to_string()))?;

        Ok(path)
    }
}

/// Final path segment of a URL, used as the stored file name
fn file_name(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or_default().to_string());

    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .unwrap_or("download")
        .to_string()
}

/// Inserts a short URL hash before the extension
fn suffixed_name(name: &str, url: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let short = &digest[..8];

    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, short, ext),
        _ => format!("{}-{}", name, short),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchedPage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StaticFetcher {
        files: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        fn new(files: &[(&str, &[u8])]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(url, bytes)| (url.to_string(), bytes.to_vec()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn resolve(&self, _url: &str) -> Result<(), CrawlError> {
            Ok(())
        }

        async fn fetch_page(&self, url: &str) -> Result<FetchedPage, CrawlError> {
            Err(CrawlError::FetchFailed {
                url: url.to_string(),
                reason: "pages not served".to_string(),
            })
        }

        async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.files
                .get(url)
                .cloned()
                .ok_or_else(|| CrawlError::FetchFailed {
                    url: url.to_string(),
                    reason: "404".to_string(),
                })
        }
    }

    fn flags(documents: bool, images: bool) -> DownloadFlags {
        DownloadFlags {
            documents,
            images,
            audio: false,
            video: false,
        }
    }

    #[test]
    fn test_route_respects_flags() {
        let router = DownloadRouter::new("/tmp/session", flags(true, false), false);
        assert_eq!(
            router.route("https://x.test/a.pdf"),
            Some(ResourceCategory::Document)
        );
        assert_eq!(router.route("https://x.test/a.png"), None);
        assert_eq!(router.route("https://x.test/page"), None);
    }

    #[test]
    fn test_all_files_override() {
        let router = DownloadRouter::new("/tmp/session", flags(false, false), true);
        assert!(router.is_enabled());
        assert_eq!(
            router.route("https://x.test/a.mkv"),
            Some(ResourceCategory::Video)
        );
        assert_eq!(router.route("https://x.test/a.html"), None);
    }

    #[test]
    fn test_disabled_router() {
        let router = DownloadRouter::new("/tmp/session", flags(false, false), false);
        assert!(!router.is_enabled());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("https://x.test/docs/report.pdf?v=2"), "report.pdf");
        assert_eq!(file_name("https://x.test/"), "download");
        assert_eq!(file_name("report.pdf"), "report.pdf");
    }

    #[test]
    fn test_suffixed_name_is_deterministic() {
        let a = suffixed_name("report.pdf", "https://a.test/report.pdf");
        let b = suffixed_name("report.pdf", "https://a.test/report.pdf");
        let c = suffixed_name("report.pdf", "https://b.test/report.pdf");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("report-"));
        assert!(a.ends_with(".pdf"));
        assert_eq!(a.len(), "report-".len() + 8 + ".pdf".len());
    }

    #[test]
    fn test_target_path_collision() {
        let dir = tempfile::tempdir().unwrap();
        let router = DownloadRouter::new(dir.path(), flags(true, false), false);

        let first = router.target_path(ResourceCategory::Document, "https://a.test/r.pdf");
        assert_eq!(first, dir.path().join("documents").join("r.pdf"));

        std::fs::create_dir_all(first.parent().unwrap()).unwrap();
        std::fs::write(&first, b"a").unwrap();

        let second = router.target_path(ResourceCategory::Document, "https://b.test/r.pdf");
        assert_ne!(second, first);
        assert_eq!(second.parent(), first.parent());
    }

    #[tokio::test]
    async fn test_process_stores_enabled_categories() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::new(&[
            ("https://x.test/r.pdf", b"%PDF"),
            ("https://x.test/p.png", b"PNG"),
        ]);
        let mut router = DownloadRouter::new(dir.path(), flags(true, false), false);

        let report = router
            .process(
                &fetcher,
                &[
                    "https://x.test/r.pdf".to_string(),
                    "https://x.test/p.png".to_string(),
                    "https://x.test/page".to_string(),
                ],
            )
            .await;

        assert_eq!(report.stored.len(), 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 0);
        let stored = std::fs::read(dir.path().join("documents").join("r.pdf")).unwrap();
        assert_eq!(stored, b"%PDF");
        assert_eq!(fetcher.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_process_fetches_each_url_once() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::new(&[("https://x.test/r.pdf", b"%PDF")]);
        let mut router = DownloadRouter::new(dir.path(), flags(true, false), false);
        let refs = vec!["https://x.test/r.pdf".to_string()];

        router.process(&fetcher, &refs).await;
        let report = router.process(&fetcher, &refs).await;

        assert_eq!(report.skipped, 1);
        assert_eq!(fetcher.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_process_failure_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::new(&[]);
        let mut router = DownloadRouter::new(dir.path(), flags(true, false), false);

        let report = router
            .process(&fetcher, &["https://x.test/missing.pdf".to_string()])
            .await;

        assert_eq!(report.failed, 1);
        assert!(report.stored.is_empty());
    }
}
