//! The visited / unvisited URL sets
//!
//! A URL is a member of at most one of the two sets. Once it is visited it
//! never returns to `unvisited`. Both sets keep insertion order so that
//! crawl passes and persisted files are deterministic.

use crate::state::ContentFingerprint;
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use uuid::Uuid;

/// Value recorded for a visited URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VisitMark {
    /// The URL was crawled (or collapsed into) this content
    Fingerprint(ContentFingerprint),
    /// Opaque, never-reused marker for failures, redirect hops and
    /// superseded base URLs
    Marker(String),
}

impl VisitMark {
    /// Creates a fresh opaque marker
    pub fn marker() -> Self {
        Self::Marker(Uuid::new_v4().simple().to_string())
    }

    /// Parses the persisted form; anything that is not a fingerprint is a marker
    pub fn parse(s: &str) -> Self {
        if s.len() == ContentFingerprint::HEX_LEN {
            if let Ok(fingerprint) = s.parse() {
                return Self::Fingerprint(fingerprint);
            }
        }
        Self::Marker(s.to_string())
    }

    pub fn fingerprint(&self) -> Option<&ContentFingerprint> {
        match self {
            Self::Fingerprint(fp) => Some(fp),
            Self::Marker(_) => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Self::Marker(_))
    }
}

impl fmt::Display for VisitMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fingerprint(fp) => write!(f, "{}", fp),
            Self::Marker(marker) => write!(f, "{}", marker),
        }
    }
}

impl From<ContentFingerprint> for VisitMark {
    fn from(fingerprint: ContentFingerprint) -> Self {
        Self::Fingerprint(fingerprint)
    }
}

/// Visited and unvisited URL sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    visited: IndexMap<String, VisitMark>,
    unvisited: IndexSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a frontier from persisted sets
    ///
    /// A URL listed in both is kept as visited only.
    pub fn from_parts(
        visited: impl IntoIterator<Item = (String, VisitMark)>,
        unvisited: impl IntoIterator<Item = String>,
    ) -> Self {
        let visited: IndexMap<String, VisitMark> = visited.into_iter().collect();
        let unvisited = unvisited
            .into_iter()
            .filter(|url| !visited.contains_key(url))
            .collect();

        Self { visited, unvisited }
    }

    /// Adds a URL to `unvisited` unless it is already known
    ///
    /// Returns true if the URL was added.
    pub fn admit(&mut self, url: &str) -> bool {
        if self.visited.contains_key(url) || self.unvisited.contains(url) {
            return false;
        }
        self.unvisited.insert(url.to_string())
    }

    /// Snapshot of `unvisited` for one crawl pass
    ///
    /// URLs admitted while the pass runs are picked up by the next one.
    pub fn take_batch(&self) -> Vec<String> {
        self.unvisited.iter().cloned().collect()
    }

    /// Moves a URL into `visited`, replacing any previous mark
    ///
    /// Returns the previous mark if the URL was already visited.
    pub fn mark_visited(&mut self, url: &str, mark: VisitMark) -> Option<VisitMark> {
        self.unvisited.shift_remove(url);
        self.visited.insert(url.to_string(), mark)
    }

    /// Drops a URL from `unvisited` without visiting it
    pub fn discard(&mut self, url: &str) -> bool {
        self.unvisited.shift_remove(url)
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains_key(url)
    }

    pub fn is_unvisited(&self, url: &str) -> bool {
        self.unvisited.contains(url)
    }

    pub fn visit_mark(&self, url: &str) -> Option<&VisitMark> {
        self.visited.get(url)
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn unvisited_len(&self) -> usize {
        self.unvisited.len()
    }

    /// True once nothing remains to crawl
    pub fn is_drained(&self) -> bool {
        self.unvisited.is_empty()
    }

    pub fn visited(&self) -> impl Iterator<Item = (&str, &VisitMark)> {
        self.visited.iter().map(|(url, mark)| (url.as_str(), mark))
    }

    pub fn unvisited(&self) -> impl Iterator<Item = &str> {
        self.unvisited.iter().map(String::as_str)
    }

    /// Fingerprints recorded for visited URLs (markers excluded)
    pub fn fingerprints(&self) -> impl Iterator<Item = ContentFingerprint> + '_ {
        self.visited.values().filter_map(|mark| mark.fingerprint().copied())
    }

    /// Number of visited URLs recorded with a marker
    pub fn marker_count(&self) -> usize {
        self.visited.values().filter(|mark| mark.is_marker()).count()
    }
}
