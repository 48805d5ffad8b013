//! Crawl state
//!
//! # Components
//!
//! - `Frontier`: the disjoint visited / unvisited URL sets
//! - `ContentFingerprint` / `SeenFingerprints`: exact-match content deduplication
//! - `CrawlPhase`: the orchestrator's phase state machine
//! - `Session`: config, frontier, seen fingerprints and results owned together

mod fingerprint;
mod frontier;
mod phase;
mod session;

pub use fingerprint::{normalize_text, ContentFingerprint, DedupDecision, SeenFingerprints};
pub use frontier::{Frontier, VisitMark};
pub use phase::CrawlPhase;
pub use session::Session;
