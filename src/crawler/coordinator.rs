//! Crawl coordinator - the crawl state machine
//!
//! The coordinator owns one `Session` and moves it through
//! `Seeding -> Crawling -> Terminated`, or to `Draining` when the
//! cancellation flag is raised. URLs are crawled one at a time; the flag is
//! only checked between URLs, so the page in flight always completes.
//!
//! Per URL:
//! 1. Skip it if it is already visited
//! 2. Resolve the host and fetch the page (failure marks it visited for good)
//! 3. Optionally re-fetch it through the renderer
//! 4. Mark redirect hops visited and scope-check the final URL
//! 5. Apply `<base href>`, then deduplicate on the page text
//! 6. Admit in-scope links and route resource downloads
//! 7. Mark visited, append the result, and index it

use crate::crawler::fetcher::{build_http_client, Fetcher, ReqwestFetcher};
use crate::crawler::index::{ElasticsearchIndexer, Indexer};
use crate::crawler::parser::parse_html;
use crate::crawler::render::{build_render_client, PrerenderRenderer, Renderer};
use crate::output::{CrawlResult, RedirectHop, SessionStatistics};
use crate::resource::DownloadRouter;
use crate::state::{ContentFingerprint, CrawlPhase, DedupDecision, Session, VisitMark};
use crate::storage::Storage;
use crate::url::ScopePolicy;
use crate::{CrawlError, CreeperError};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Progress is logged every this many crawled URLs
const PROGRESS_INTERVAL: usize = 10;

/// The frontier is persisted every this many crawled URLs
const PERSIST_INTERVAL: usize = 50;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Frontier drained; results consolidated
    Completed,
    /// Cancelled; frontier persisted for a later resume
    Interrupted,
}

impl CrawlOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Interrupted => 1,
        }
    }
}

/// What happened to one URL
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// A result was produced and appended
    Crawled(CrawlResult),
    /// The content was already seen under another URL
    Duplicate,
    /// The URL (or its redirect target) was already visited
    AlreadyVisited,
    /// The redirect chain left the crawl scope
    OutOfScope,
    /// The URL could not be fetched
    Failed(CrawlError),
}

/// Main crawl coordinator
pub struct Coordinator {
    session: Session,
    storage: Box<dyn Storage + Send>,
    fetcher: Box<dyn Fetcher>,
    renderer: Option<Box<dyn Renderer>>,
    indexer: Option<Box<dyn Indexer>>,
    scope: ScopePolicy,
    downloads: DownloadRouter,
    cancel: Arc<AtomicBool>,
    phase: CrawlPhase,
    crawled: usize,
}

impl Coordinator {
    /// Creates a coordinator with the given fetcher and no renderer or indexer
    pub fn new(
        session: Session,
        storage: Box<dyn Storage + Send>,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        let scope = ScopePolicy::from_config(&session.config);
        let downloads = DownloadRouter::from_config(&session.config);

        Self {
            session,
            storage,
            fetcher,
            renderer: None,
            indexer: None,
            scope,
            downloads,
            cancel: Arc::new(AtomicBool::new(false)),
            phase: CrawlPhase::Seeding,
            crawled: 0,
        }
    }

    /// Creates a coordinator with the HTTP collaborators the session asks for
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CreeperError)` - An HTTP client could not be built
    pub fn from_config(
        session: Session,
        storage: Box<dyn Storage + Send>,
    ) -> Result<Self, CreeperError> {
        let client = build_http_client()?;

        let renderer: Option<Box<dyn Renderer>> =
            match (session.config.dynamic, &session.config.render_endpoint) {
                (true, Some(endpoint)) => {
                    tracing::info!("Rendering pages through {}", endpoint);
                    Some(Box::new(PrerenderRenderer::new(
                        build_render_client()?,
                        endpoint,
                    )))
                }
                _ => None,
            };

        let indexer: Option<Box<dyn Indexer>> =
            session.config.index_endpoint.as_ref().map(|endpoint| {
                tracing::info!("Indexing results into {}", endpoint);
                Box::new(ElasticsearchIndexer::new(client.clone(), endpoint)) as Box<dyn Indexer>
            });

        let mut coordinator =
            Self::new(session, storage, Box::new(ReqwestFetcher::new(client)));
        coordinator.renderer = renderer;
        coordinator.indexer = indexer;
        Ok(coordinator)
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_indexer(mut self, indexer: Box<dyn Indexer>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Shares an externally owned cancellation flag
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the flag that, once set, drains the run at the next URL boundary
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn advance(&mut self, next: CrawlPhase) -> Result<(), CreeperError> {
        self.phase = self.phase.transition(next)?;
        tracing::debug!("Phase: {}", self.phase);
        Ok(())
    }

    /// Runs the session until the frontier drains or cancellation is observed
    pub async fn run(&mut self) -> Result<CrawlOutcome, CreeperError> {
        if self.phase != CrawlPhase::Seeding {
            return Err(CreeperError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Crawling,
            });
        }

        if self.session.seed() {
            tracing::info!("Seeded frontier with {}", self.scope.seed());
        }
        self.storage.save_frontier(&self.session.frontier)?;

        if self.is_cancelled() {
            return self.drain().await;
        }

        self.advance(CrawlPhase::Crawling)?;
        tracing::info!(
            "Crawling {} ({} URLs queued)",
            self.scope.seed(),
            self.session.frontier.unvisited_len()
        );

        let start_time = Instant::now();

        while !self.session.is_drained() {
            let batch = self.session.frontier.take_batch();
            tracing::debug!("Starting pass over {} URLs", batch.len());

            for url in batch {
                if self.is_cancelled() {
                    return self.drain().await;
                }

                let outcome = self.crawl_one(&url).await?;

                if self.session.frontier.is_unvisited(&url) {
                    tracing::debug!("{} left unresolved, marking visited", url);
                    self.session.frontier.mark_visited(&url, VisitMark::marker());
                }

                if outcome == PageOutcome::AlreadyVisited {
                    continue;
                }

                self.crawled += 1;

                if self.crawled % PROGRESS_INTERVAL == 0 {
                    let rate = self.crawled as f64 / start_time.elapsed().as_secs_f64();
                    tracing::info!(
                        "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                        self.crawled,
                        self.session.frontier.unvisited_len(),
                        rate
                    );
                }

                if self.crawled % PERSIST_INTERVAL == 0 {
                    self.storage.save_frontier(&self.session.frontier)?;
                }
            }
        }

        tracing::info!(
            "Crawl completed: {} pages crawled in {:?}",
            self.crawled,
            start_time.elapsed()
        );
        self.terminate().await
    }

    /// Persists the frontier and stops without finishing the batch
    async fn drain(&mut self) -> Result<CrawlOutcome, CreeperError> {
        self.advance(CrawlPhase::Draining)?;

        self.storage.save_frontier(&self.session.frontier)?;
        self.release().await;

        tracing::warn!(
            "Crawl interrupted: {} URLs left to crawl",
            self.session.frontier.unvisited_len()
        );
        self.log_statistics();
        Ok(CrawlOutcome::Interrupted)
    }

    /// Persists final state and consolidates the result log
    async fn terminate(&mut self) -> Result<CrawlOutcome, CreeperError> {
        self.advance(CrawlPhase::Terminated)?;

        self.storage.save_frontier(&self.session.frontier)?;
        self.storage.remove_unvisited()?;
        self.storage.consolidate_results(&self.session.results)?;
        self.release().await;

        self.log_statistics();
        Ok(CrawlOutcome::Completed)
    }

    async fn release(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            renderer.release().await;
        }
    }

    fn log_statistics(&self) {
        let stats = SessionStatistics::from_session(&self.session);
        tracing::info!(
            visited = stats.visited,
            unvisited = stats.unvisited,
            errored = stats.errored,
            unique = stats.unique_fingerprints,
            results = stats.results,
            "Session statistics"
        );
    }

    /// Records a fetch failure; permanent failures mark the URL visited
    fn fail(&mut self, url: &str, error: CrawlError) -> PageOutcome {
        tracing::warn!("{}", error);

        if error.is_permanent() {
            self.session.frontier.mark_visited(url, VisitMark::marker());
        }

        PageOutcome::Failed(error)
    }

    /// Crawls a single URL to completion
    ///
    /// Only storage failures are returned as errors; every per-page problem
    /// is recorded in the session and reported through `PageOutcome`.
    pub async fn crawl_one(&mut self, url: &str) -> Result<PageOutcome, CreeperError> {
        tracing::info!(
            "Links:[{}] {}",
            self.session.frontier.unvisited_len(),
            url
        );

        if self.session.frontier.is_visited(url) {
            tracing::debug!("\tDuplicate URL: skipping...");
            self.session.frontier.discard(url);
            return Ok(PageOutcome::AlreadyVisited);
        }

        if let Err(e) = self.fetcher.resolve(url).await {
            return Ok(self.fail(url, e));
        }

        let page = match self.fetcher.fetch_page(url).await {
            Ok(page) => page,
            Err(e) => return Ok(self.fail(url, e)),
        };

        let html = match &self.renderer {
            Some(renderer) => match renderer.render(url).await {
                Ok(rendered) => rendered,
                Err(e) => {
                    tracing::warn!("{}; using fetched content", e);
                    page.body.clone()
                }
            },
            None => page.body.clone(),
        };

        let mut target = page.final_url.clone();

        if page.was_redirected() {
            for hop in &page.redirects {
                tracing::info!("\tredir: {} {}", hop.status_code, hop.url);
                if hop.url != target {
                    self.session
                        .frontier
                        .mark_visited(&hop.url, VisitMark::marker());
                }
            }
            tracing::info!("\tredir: {} {}", page.final_status, target);

            if !self.scope.admits(&target) {
                tracing::info!("\tRedirect target {} is out of scope", target);
                return Ok(PageOutcome::OutOfScope);
            }

            if self.session.frontier.is_visited(&target) {
                tracing::debug!("\tDuplicate URL: skipping...");
                self.session.frontier.discard(&target);
                return Ok(PageOutcome::AlreadyVisited);
            }
        }

        let page_url = match Url::parse(&target) {
            Ok(page_url) => page_url,
            Err(e) => {
                let error = CrawlError::FetchFailed {
                    url: target.clone(),
                    reason: e.to_string(),
                };
                return Ok(self.fail(url, error));
            }
        };

        let parsed = parse_html(&html, &page_url);

        if let Some(base) = parsed.base.as_ref().filter(|base| **base != target) {
            tracing::debug!("\tbase href: {} -> {}", target, base);
            self.session
                .frontier
                .mark_visited(&target, VisitMark::marker());
            target = base.clone();

            if self.session.frontier.is_visited(&target) {
                self.session.frontier.discard(&target);
                return Ok(PageOutcome::AlreadyVisited);
            }
        }

        let fingerprint = ContentFingerprint::of_text(&parsed.text);

        if self.session.deduplicate(&target, fingerprint) == DedupDecision::Duplicate {
            tracing::info!("\tHex match: {} skipping...", fingerprint);
            return Ok(PageOutcome::Duplicate);
        }

        let mut admitted = 0;
        for link in &parsed.links {
            if self.scope.admits(link) && self.session.frontier.admit(link) {
                admitted += 1;
            }
        }
        tracing::debug!(
            "\t{} links found, {} newly admitted",
            parsed.links.len(),
            admitted
        );

        if self.downloads.is_enabled() && !parsed.resources.is_empty() {
            let report = self
                .downloads
                .process(self.fetcher.as_ref(), &parsed.resources)
                .await;
            tracing::debug!(
                "\tdownloads: {} stored, {} skipped, {} failed",
                report.stored.len(),
                report.skipped,
                report.failed
            );
        }

        let redirects = if page.was_redirected() {
            let mut chain = page.redirects.clone();
            chain.push(RedirectHop {
                url: page.final_url.clone(),
                status_code: page.final_status,
            });
            chain
        } else {
            Vec::new()
        };

        let result = CrawlResult {
            url: target.clone(),
            status_code: page.status_code,
            fingerprint,
            content_type: page.content_type.clone(),
            title: parsed.title,
            text: parsed.text,
            links: parsed.links,
            redirects,
            crawled_at: Utc::now(),
        };

        self.session
            .frontier
            .mark_visited(&target, VisitMark::Fingerprint(fingerprint));
        self.storage.append_result(&result)?;

        if let Some(indexer) = &self.indexer {
            if let Err(e) = indexer.index(&result).await {
                tracing::warn!("{}", e);
            }
        }

        self.session.record(result.clone());
        Ok(PageOutcome::Crawled(result))
    }
}

/// Runs a session to completion or cancellation with HTTP collaborators
///
/// # Example
///
/// ```no_run
/// use creeper::crawler::run_crawl;
/// use creeper::storage::SessionDirectory;
/// use std::sync::atomic::AtomicBool;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (dir, config) = SessionDirectory::open("x.test")?;
/// let session = dir.load_session(config)?;
/// let outcome = run_crawl(session, dir, Arc::new(AtomicBool::new(false))).await?;
/// println!("{:?}", outcome);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<S>(
    session: Session,
    storage: S,
    cancel: Arc<AtomicBool>,
) -> Result<CrawlOutcome, CreeperError>
where
    S: Storage + Send + 'static,
{
    let mut coordinator =
        Coordinator::from_config(session, Box::new(storage))?.with_cancel_flag(cancel);
    coordinator.run().await
}
