//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the crawl lifecycle:
//! - Seeding the frontier from configuration
//! - Dispatching fetch tasks up to the concurrency ceiling
//! - Merging each page into the graph and the frontier
//! - Draining in-flight work on budget, exhaustion or cancellation
//! - Freezing the graph and handing back a single `CrawlResult`

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::parser::{process_page, PageRules};
use crate::crawler::result::{CrawlCounters, CrawlResult, StopReason};
use crate::graph::GraphAccumulator;
use crate::state::CrawlPhase;
use crate::url::{canonicalize, AllowedDomain};
use crate::{ConfigError, FetchError, RippleError};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Pages between progress reports
const PROGRESS_INTERVAL: u64 = 10;

/// State shared with every fetch task
struct CrawlShared {
    frontier: Frontier,
    fetcher: Fetcher,
    graph: GraphAccumulator,
    rules: PageRules,
}

/// What one successfully processed page contributed
#[derive(Debug)]
struct PageContribution {
    edges_added: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    shared: Arc<CrawlShared>,
    phase: CrawlPhase,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Validates the configuration and builds the HTTP client. Configuration
    /// problems are fatal here, before any fetch is issued.
    pub fn new(config: Config) -> Result<Self, RippleError> {
        crate::config::validate(&config)?;

        let allowed_domain = AllowedDomain::parse(&config.crawl.allowed_domain)
            .map_err(|e| ConfigError::InvalidDomain(e.to_string()))?;

        let client = build_http_client(&config.user_agent, &config.politeness)?;
        let fetcher = Fetcher::new(client, allowed_domain.clone(), &config.politeness);

        let budget = usize::try_from(config.crawl.page_budget).unwrap_or(usize::MAX);

        let shared = CrawlShared {
            frontier: Frontier::new(budget),
            fetcher,
            graph: GraphAccumulator::new(),
            rules: PageRules {
                base_language: config.crawl.base_language.clone(),
                article_prefix: config.crawl.article_prefix.clone(),
                allowed_domain,
            },
        };

        Ok(Self {
            config: Arc::new(config),
            shared: Arc::new(shared),
            phase: CrawlPhase::Seeding,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that stops the crawl when cancelled
    ///
    /// Cancelling lets in-flight fetches finish and merge, but no new fetch
    /// is started.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), RippleError> {
        self.phase = self.phase.transition(next)?;
        Ok(())
    }

    /// Runs the crawl to completion
    ///
    /// Consumes the coordinator: the returned result is the only hand-off of
    /// the finished graph.
    pub async fn run(mut self) -> Result<CrawlResult, RippleError> {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let mut counters = CrawlCounters::default();
        let mut tasks: JoinSet<Result<PageContribution, FetchError>> = JoinSet::new();

        tracing::info!(
            "Starting crawl of {} (budget {} pages, {} seeds)",
            self.shared.rules.allowed_domain.host(),
            self.config.crawl.page_budget,
            self.config.crawl.seeds.len()
        );

        let mut stop_reason = if self.cancel.is_cancelled() {
            self.transition(CrawlPhase::Draining)?;
            StopReason::Cancelled
        } else {
            self.seed();
            self.transition(CrawlPhase::Running)?;
            StopReason::FrontierExhausted
        };

        if self.phase.accepts_new_fetches() {
            let max_duration = self.config.crawl.max_duration_secs.map(Duration::from_secs);
            let deadline = async move {
                match max_duration {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::pin!(deadline);

            let max_in_flight = self.shared.fetcher.max_concurrency();

            stop_reason = loop {
                if self.cancel.is_cancelled() {
                    break StopReason::Cancelled;
                }

                while tasks.len() < max_in_flight {
                    match self.shared.frontier.claim_next() {
                        Some(entry) => self.dispatch(&mut tasks, entry),
                        None => break,
                    }
                }

                if self.shared.frontier.is_saturated() {
                    break StopReason::BudgetReached;
                }
                if tasks.is_empty() {
                    break StopReason::FrontierExhausted;
                }

                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        break StopReason::Cancelled;
                    }
                    _ = &mut deadline => {
                        tracing::warn!("Wall-clock limit reached, stopping dispatch");
                        self.cancel.cancel();
                        break StopReason::TimeLimit;
                    }
                    Some(joined) = tasks.join_next() => {
                        self.handle_completion(joined, &mut counters, start_time);
                    }
                }
            };

            self.transition(CrawlPhase::Draining)?;
        }

        tracing::info!(
            "Draining ({}): waiting for {} in-flight fetches",
            stop_reason,
            tasks.len()
        );
        while let Some(joined) = tasks.join_next().await {
            self.handle_completion(joined, &mut counters, start_time);
        }

        self.transition(CrawlPhase::Finalized)?;
        let graph = self.shared.graph.finalize()?;

        tracing::info!(
            "Crawl finalized: {} pages processed ({} ok, {} failed), {} languages, {} edges in {:?}",
            counters.processed(),
            counters.succeeded,
            counters.failed(),
            graph.node_count(),
            graph.edge_count(),
            start_time.elapsed()
        );

        Ok(CrawlResult::new(
            graph,
            counters,
            started_at,
            Utc::now(),
            stop_reason,
        ))
    }

    /// Offers every configured seed to the frontier
    fn seed(&self) {
        for seed in &self.config.crawl.seeds {
            match canonicalize(seed) {
                Ok(url) => {
                    if !self.shared.frontier.offer(url, None) {
                        tracing::debug!("Seed not queued (duplicate or over budget): {}", seed);
                    }
                }
                Err(e) => tracing::warn!("Skipping seed {}: {}", seed, e),
            }
        }
        tracing::debug!("Seeded frontier with {} URLs", self.shared.frontier.len());
    }

    fn dispatch(
        &self,
        tasks: &mut JoinSet<Result<PageContribution, FetchError>>,
        entry: FrontierEntry,
    ) {
        let shared = Arc::clone(&self.shared);
        tasks.spawn(async move { crawl_page(&shared, entry).await });
    }

    fn handle_completion(
        &self,
        joined: Result<Result<PageContribution, FetchError>, JoinError>,
        counters: &mut CrawlCounters,
        start_time: Instant,
    ) {
        match joined {
            Ok(Ok(contribution)) => {
                counters.succeeded += 1;
                counters.edges_added += contribution.edges_added as u64;
            }
            Ok(Err(e)) if e.is_transient() => {
                tracing::warn!("Giving up after retries: {}", e);
                counters.failed_transient += 1;
            }
            Ok(Err(e)) => {
                tracing::info!("Skipping page: {}", e);
                counters.failed_permanent += 1;
            }
            Err(e) => {
                tracing::error!("Fetch task failed: {}", e);
                counters.failed_permanent += 1;
            }
        }

        let processed = counters.processed();
        if processed % PROGRESS_INTERVAL == 0 {
            let rate = processed as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress: {} pages processed, {} in frontier, {:.2} pages/sec",
                processed,
                self.shared.frontier.len(),
                rate
            );
        }
    }
}

/// Runs a complete crawl with a fresh coordinator
///
/// Use `Coordinator::new` directly when the caller needs the cancellation
/// token.
pub async fn run_crawl(config: Config) -> Result<CrawlResult, RippleError> {
    Coordinator::new(config)?.run().await
}

/// Fetches one page and merges it into the graph and the frontier
async fn crawl_page(
    shared: &CrawlShared,
    entry: FrontierEntry,
) -> Result<PageContribution, FetchError> {
    match &entry.referer {
        Some(referer) => tracing::debug!("Visiting {} (from {})", entry.url, referer),
        None => tracing::debug!("Visiting {}", entry.url),
    }

    let page = shared.fetcher.fetch(&entry.url).await?;
    let processed = process_page(&page.final_url, &page.body, &shared.rules)?;

    let edges_added = if processed.has_cooccurrence() {
        match shared
            .graph
            .record_cooccurrence(&processed.languages, &processed.article_id)
        {
            Ok(added) => added,
            Err(e) => {
                tracing::error!("Dropping languages of {}: {}", processed.article_id, e);
                0
            }
        }
    } else {
        0
    };

    let mut offered = 0;
    for link in processed.links {
        if shared.frontier.offer(link, Some(&page.final_url)) {
            offered += 1;
        }
    }

    tracing::debug!(
        "Added {} edges for: {} ({} languages, {} new links)",
        edges_added,
        processed.article_id,
        processed.languages.len(),
        offered
    );

    Ok(PageContribution { edges_added })
}
