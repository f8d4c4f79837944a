/// Crawl phase definitions for the orchestrator state machine
///
/// ```text
/// Seeding ──> Running ──> Draining ──> Finalized
///    └───────────────────────^
/// ```
///
/// A stop signal during seeding goes straight to draining.
use crate::RippleError;
use std::fmt;

/// The lifecycle phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Seed URLs and budget are being loaded into the frontier
    Seeding,

    /// Fetches are being dispatched up to the concurrency ceiling
    Running,

    /// No new fetches start; in-flight fetches are awaited and merged
    Draining,

    /// The graph is frozen and has been handed off
    Finalized,
}

impl CrawlPhase {
    /// Returns true if `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Running)
                | (Self::Seeding, Self::Draining)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Finalized)
        )
    }

    /// Moves to `next`, or fails with `InvalidTransition`
    pub fn transition(self, next: CrawlPhase) -> Result<CrawlPhase, RippleError> {
        if self.can_transition_to(next) {
            tracing::debug!("Crawl phase {} -> {}", self, next);
            Ok(next)
        } else {
            Err(RippleError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns true if new fetches may still be dispatched
    pub fn accepts_new_fetches(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
