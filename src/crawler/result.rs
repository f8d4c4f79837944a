use crate::graph::LanguageGraph;
use chrono::{DateTime, Utc};
use std::fmt;

/// Why the crawl stopped dispatching new fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The page budget was spent
    BudgetReached,

    /// Nothing left to fetch and nothing in flight
    FrontierExhausted,

    /// An external stop signal was received
    Cancelled,

    /// The wall-clock ceiling elapsed
    TimeLimit,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetReached => "budget reached",
            Self::FrontierExhausted => "frontier exhausted",
            Self::Cancelled => "cancelled",
            Self::TimeLimit => "time limit",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-page outcome tallies kept by the orchestrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlCounters {
    pub succeeded: u64,
    pub failed_transient: u64,
    pub failed_permanent: u64,
    pub edges_added: u64,
}

impl CrawlCounters {
    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed()
    }

    pub fn failed(&self) -> u64 {
        self.failed_transient + self.failed_permanent
    }
}

/// The finished crawl: a frozen graph plus run statistics
///
/// Produced exactly once per run by the coordinator's final transition.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    graph: LanguageGraph,
    counters: CrawlCounters,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    stop_reason: StopReason,
}

impl CrawlResult {
    pub(crate) fn new(
        graph: LanguageGraph,
        counters: CrawlCounters,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        stop_reason: StopReason,
    ) -> Self {
        Self {
            graph,
            counters,
            started_at,
            finished_at,
            stop_reason,
        }
    }

    pub fn graph(&self) -> &LanguageGraph {
        &self.graph
    }

    /// Pages fetched or attempted, successful or not
    pub fn pages_processed(&self) -> u64 {
        self.counters.processed()
    }

    pub fn pages_succeeded(&self) -> u64 {
        self.counters.succeeded
    }

    pub fn pages_failed(&self) -> u64 {
        self.counters.failed()
    }

    pub fn counters(&self) -> &CrawlCounters {
        &self.counters
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }
}
