//! Frontier and visited set
//!
//! The frontier is a FIFO queue of discovered URLs, which makes the crawl
//! breadth-first. The visited set holds every canonical URL that has been
//! claimed for fetching and is the only deduplication mechanism. Both live
//! behind one mutex so that the budget check, the membership test and the
//! insert happen atomically.

use crate::url::canonicalize_url;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use url::Url;

/// A discovered URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Canonical URL to fetch
    pub url: Url,

    /// Page the URL was found on; None for seeds
    pub referer: Option<Url>,
}

/// Shared frontier with a hard page budget
///
/// Once the visited set reaches the budget the frontier saturates: pending
/// entries are dropped and every later `offer` is a no-op.
#[derive(Debug)]
pub struct Frontier {
    budget: usize,
    inner: Mutex<FrontierState>,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    saturated: bool,
}

impl FrontierState {
    fn saturate(&mut self) {
        if !self.saturated {
            tracing::info!(
                "Page budget reached, dropping {} pending URLs",
                self.queue.len()
            );
        }
        self.saturated = true;
        self.queue.clear();
        self.queued.clear();
    }
}

impl Frontier {
    /// Creates an empty frontier that allows at most `budget` visits
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            inner: Mutex::new(FrontierState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FrontierState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a candidate URL
    ///
    /// The URL is canonicalized first. It is dropped silently if it is
    /// already visited or queued, if it is not HTTP(S), or if the budget has
    /// been reached. Returns true if it was queued.
    pub fn offer(&self, url: Url, referer: Option<&Url>) -> bool {
        let url = match canonicalize_url(url) {
            Ok(url) => url,
            Err(e) => {
                tracing::trace!("Dropping uncanonicalizable URL: {}", e);
                return false;
            }
        };

        let mut state = self.lock();
        if state.saturated || state.visited.len() >= self.budget {
            state.saturate();
            return false;
        }

        let key = url.as_str().to_string();
        if state.visited.contains(&key) || state.queued.contains(&key) {
            return false;
        }

        state.queued.insert(key);
        state.queue.push_back(FrontierEntry {
            url,
            referer: referer.cloned(),
        });
        true
    }

    /// Returns the next URL to fetch, or None when empty or saturated
    pub fn next(&self) -> Option<FrontierEntry> {
        let mut state = self.lock();
        if state.saturated {
            return None;
        }
        let entry = state.queue.pop_front()?;
        state.queued.remove(entry.url.as_str());
        Some(entry)
    }

    /// Atomically claims a URL for fetching
    ///
    /// Returns false if the URL was already visited or the budget is spent;
    /// the caller must not fetch it in that case. Claiming the last budgeted
    /// URL saturates the frontier.
    pub fn mark_visited(&self, url: &Url) -> bool {
        let key = match canonicalize_url(url.clone()) {
            Ok(url) => url.as_str().to_string(),
            Err(_) => return false,
        };

        let mut state = self.lock();
        if state.visited.len() >= self.budget {
            state.saturate();
            return false;
        }
        if !state.visited.insert(key) {
            return false;
        }
        if state.visited.len() >= self.budget {
            state.saturate();
        }
        true
    }

    /// Claims the next unvisited URL, skipping entries already visited
    pub fn claim_next(&self) -> Option<FrontierEntry> {
        while let Some(entry) = self.next() {
            if self.mark_visited(&entry.url) {
                return Some(entry);
            }
        }
        None
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        match canonicalize_url(url.clone()) {
            Ok(url) => self.lock().visited.contains(url.as_str()),
            Err(_) => false,
        }
    }

    /// Number of URLs claimed so far; never exceeds the budget
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Returns true once the budget has been reached
    pub fn is_saturated(&self) -> bool {
        self.lock().saturated
    }

    pub fn budget(&self) -> usize {
        self.budget
    }
}
