//! Session statistics
//!
//! Computed from persisted state, so they can be printed for any session
//! directory without running a crawl.

use crate::state::{Frontier, Session};
use crate::storage::Storage;
use crate::CreeperError;
use std::collections::HashSet;

/// Session statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatistics {
    /// URLs recorded visited (crawled, collapsed, failed or skipped hops)
    pub visited: usize,

    /// URLs still waiting to be crawled
    pub unvisited: usize,

    /// Visited URLs recorded with an opaque marker
    pub errored: usize,

    /// Distinct content fingerprints
    pub unique_fingerprints: usize,

    /// Results in the result log
    pub results: usize,
}

impl SessionStatistics {
    fn from_parts(frontier: &Frontier, results: usize) -> Self {
        let unique: HashSet<_> = frontier.fingerprints().collect();

        Self {
            visited: frontier.visited_len(),
            unvisited: frontier.unvisited_len(),
            errored: frontier.marker_count(),
            unique_fingerprints: unique.len(),
            results,
        }
    }

    /// Statistics of an in-memory session
    pub fn from_session(session: &Session) -> Self {
        Self::from_parts(&session.frontier, session.results.len())
    }

    /// True when nothing remains to crawl
    pub fn is_drained(&self) -> bool {
        self.unvisited == 0
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The session storage to read
///
/// # Returns
///
/// * `Ok(SessionStatistics)` - Successfully loaded statistics
/// * `Err(CreeperError)` - Failed to read the frontier or result log
pub fn load_statistics(storage: &dyn Storage) -> Result<SessionStatistics, CreeperError> {
    let frontier = storage.load_frontier()?;
    let results = storage.load_results()?;

    Ok(SessionStatistics::from_parts(&frontier, results.len()))
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &SessionStatistics) {
    println!("=== Session Statistics ===\n");

    println!("Frontier:");
    println!("  Visited URLs: {}", stats.visited);
    println!("  Unvisited URLs: {}", stats.unvisited);
    println!("  Failed / marked: {}", stats.errored);
    println!();

    println!("Content:");
    println!("  Unique fingerprints: {}", stats.unique_fingerprints);
    println!("  Results recorded: {}", stats.results);
    println!();

    let total = stats.visited + stats.unvisited;
    let progress = if total > 0 {
        (stats.visited as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    if stats.is_drained() {
        println!("Status: complete ({} URLs visited)", stats.visited);
    } else {
        println!(
            "Status: {:.1}% ({} / {} URLs visited)",
            progress, stats.visited, total
        );
    }
}
