//! Crawl phase definitions
//!
//! The orchestrator moves through these phases in order; cancellation
//! diverts it to `Draining` instead of `Terminated`.

use crate::CreeperError;
use std::fmt;

/// Current phase of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Session is being loaded or created and the seed admitted
    Seeding,

    /// Batches are being taken from the frontier and crawled
    Crawling,

    /// Cancellation observed; state is persisted and the run stops early
    Draining,

    /// Frontier drained; final state persisted and results consolidated
    Terminated,
}

impl CrawlPhase {
    /// Returns true if no further transition is possible
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Draining | Self::Terminated)
    }

    /// Returns true if moving to `next` is legal
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Crawling)
                | (Self::Seeding, Self::Draining)
                | (Self::Crawling, Self::Draining)
                | (Self::Crawling, Self::Terminated)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(self, next: CrawlPhase) -> Result<CrawlPhase, CreeperError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CreeperError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Crawling => "crawling",
            Self::Draining => "draining",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
