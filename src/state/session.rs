//! The session aggregate and its resume reconciliation

use crate::config::SessionConfig;
use crate::output::CrawlResult;
use crate::state::{ContentFingerprint, DedupDecision, Frontier, SeenFingerprints, VisitMark};
use crate::url::{normalize_url, ScopePolicy};
use std::collections::HashSet;

/// One resumable crawl: configuration, frontier, seen content and results
///
/// Owned by exactly one orchestrator; nothing else mutates it.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: SessionConfig,
    pub frontier: Frontier,
    pub seen: SeenFingerprints,
    pub results: Vec<CrawlResult>,
}

impl Session {
    /// Creates an empty session for a new seed
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            frontier: Frontier::new(),
            seen: SeenFingerprints::new(),
            results: Vec::new(),
        }
    }

    /// Rebuilds a session from persisted state
    ///
    /// Seen fingerprints are rederived from the visited marks. The result
    /// log is authoritative: a replayed result whose URL is missing from
    /// `visited` (crash between append and frontier save) is marked visited
    /// under its fingerprint and its in-scope links are admitted again.
    /// Repeated lines for one URL keep the first.
    pub fn restore(config: SessionConfig, frontier: Frontier, replayed: Vec<CrawlResult>) -> Self {
        let scope = ScopePolicy::from_config(&config);
        let mut session = Self {
            config,
            frontier,
            seen: SeenFingerprints::new(),
            results: Vec::with_capacity(replayed.len()),
        };

        let mut urls = HashSet::new();
        let mut reconciled = Vec::new();
        for result in replayed {
            if !urls.insert(result.url.clone()) {
                tracing::debug!("Dropping repeated buffer entry for {}", result.url);
                continue;
            }

            if !session.frontier.is_visited(&result.url) {
                tracing::debug!("Reconciling {} from the result buffer", result.url);
                session
                    .frontier
                    .mark_visited(&result.url, VisitMark::Fingerprint(result.fingerprint));
                reconciled.push(session.results.len());
            }

            session.results.push(result);
        }

        // Links found after the last frontier save exist only in the log
        for index in reconciled {
            for link in &session.results[index].links {
                if scope.admits(link) && session.frontier.admit(link) {
                    tracing::debug!("Readmitted {} from the result buffer", link);
                }
            }
        }

        session.seen = session.frontier.fingerprints().collect();
        session
    }

    /// Admits the seed unless it was already visited
    pub fn seed(&mut self) -> bool {
        let seed = normalize_url(&self.config.seed);
        self.frontier.admit(&seed)
    }

    /// Gates a page on its content
    ///
    /// New content is recorded in the seen set. Already-seen content marks
    /// `url` visited under the existing fingerprint.
    pub fn deduplicate(&mut self, url: &str, fingerprint: ContentFingerprint) -> DedupDecision {
        let decision = self.seen.check(fingerprint);

        if decision == DedupDecision::Duplicate {
            self.frontier
                .mark_visited(url, VisitMark::Fingerprint(fingerprint));
        }

        decision
    }

    /// Records a completed result
    pub fn record(&mut self, result: CrawlResult) {
        self.results.push(result);
    }

    pub fn is_drained(&self) -> bool {
        self.frontier.is_drained()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn config() -> SessionConfig {
        SessionConfig::new("http://x.test/a", "/tmp/x.test")
    }

    fn result(url: &str, text: &str) -> CrawlResult {
        CrawlResult {
            url: url.to_string(),
            status_code: 200,
            fingerprint: ContentFingerprint::of_text(text),
            content_type: Some("text/html".to_string()),
            title: None,
            text: text.to_string(),
            links: Vec::new(),
            redirects: Vec::new(),
            crawled_at: Utc::now(),
        }
    }

    #[test]
    fn test_seed_admitted_once() {
        let mut session = Session::new(config());
        assert!(session.seed());
        assert!(!session.seed());
        assert!(session.frontier.is_unvisited("http://x.test/a"));
    }

    #[test]
    fn test_seed_not_admitted_when_visited() {
        let mut session = Session::new(config());
        session
            .frontier
            .mark_visited("http://x.test/a", VisitMark::marker());
        assert!(!session.seed());
        assert!(session.is_drained());
    }

    #[test]
    fn test_deduplicate() {
        let mut session = Session::new(config());
        let fp = ContentFingerprint::of_text("same text");

        assert_eq!(session.deduplicate("http://x.test/a", fp), DedupDecision::New);
        assert!(!session.frontier.is_visited("http://x.test/a"));

        session.frontier.admit("http://x.test/b");
        assert_eq!(
            session.deduplicate("http://x.test/b", fp),
            DedupDecision::Duplicate
        );
        assert_eq!(
            session.frontier.visit_mark("http://x.test/b"),
            Some(&VisitMark::Fingerprint(fp))
        );
        assert!(!session.frontier.is_unvisited("http://x.test/b"));
    }

    #[test]
    fn test_restore_rederives_seen_from_fingerprints_only() {
        let fp = ContentFingerprint::of_text("a");
        let frontier = Frontier::from_parts(
            vec![
                ("http://x.test/a".to_string(), VisitMark::Fingerprint(fp)),
                ("http://x.test/dead".to_string(), VisitMark::marker()),
            ],
            vec!["http://x.test/b".to_string()],
        );

        let session = Session::restore(config(), frontier, Vec::new());

        assert_eq!(session.seen.len(), 1);
        assert!(session.seen.contains(&fp));
        assert!(session.frontier.is_unvisited("http://x.test/b"));
    }

    #[test]
    fn test_restore_reconciles_buffer() {
        let mut frontier = Frontier::new();
        frontier.admit("http://x.test/b");

        let replayed = vec![
            result("http://x.test/b", "page b"),
            result("http://x.test/b", "page b again"),
        ];

        let session = Session::restore(config(), frontier, replayed);

        assert_eq!(session.results.len(), 1);
        assert!(session.frontier.is_visited("http://x.test/b"));
        assert!(!session.frontier.is_unvisited("http://x.test/b"));
        assert!(session
            .seen
            .contains(&ContentFingerprint::of_text("page b")));
    }

    #[test]
    fn test_restore_readmits_links_of_reconciled_results() {
        let frontier = Frontier::from_parts(
            vec![(
                "http://x.test/c".to_string(),
                VisitMark::Fingerprint(ContentFingerprint::of_text("page c")),
            )],
            Vec::new(),
        );

        let mut a = result("http://x.test/a", "page a");
        a.links = vec![
            "http://x.test/b".to_string(),
            "http://x.test/c".to_string(),
            "http://other.test/d".to_string(),
        ];

        let session = Session::restore(config(), frontier, vec![a]);

        assert!(session.frontier.is_visited("http://x.test/a"));
        assert!(session.frontier.is_unvisited("http://x.test/b"));
        assert!(!session.frontier.is_unvisited("http://x.test/c"));
        assert!(!session.frontier.is_unvisited("http://other.test/d"));
        assert_eq!(session.frontier.unvisited_len(), 1);
    }

    #[test]
    fn test_restore_leaves_links_of_saved_results() {
        let fp = ContentFingerprint::of_text("page a");
        let frontier = Frontier::from_parts(
            vec![("http://x.test/a".to_string(), VisitMark::Fingerprint(fp))],
            Vec::new(),
        );

        let mut a = result("http://x.test/a", "page a");
        a.links = vec!["http://x.test/b".to_string()];

        let session = Session::restore(config(), frontier, vec![a]);

        assert!(session.is_drained());
    }
}
