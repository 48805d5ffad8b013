//! Crawl output
//!
//! - `CrawlResult`: the per-page record appended to the result log
//! - `stats`: session statistics for `--stats` and end-of-run logging

mod result;
pub mod stats;

pub use result::{CrawlResult, RedirectHop};
pub use stats::{load_statistics, print_statistics, SessionStatistics};
