//! Language co-occurrence graph and its shared accumulator
//!
//! Every fetched article contributes its language set; each unordered pair of
//! codes in that set becomes (or strengthens) an edge. Edge weight is the
//! number of distinct articles recorded on the edge, so replaying an article
//! or completing fetches in a different order leaves the graph unchanged.

use crate::RippleError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// An unordered pair of language codes, stored sorted
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguagePair {
    first: String,
    second: String,
}

impl LanguagePair {
    /// Builds a normalized pair; `(fr, en)` and `(en, fr)` are equal
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// A weighted co-occurrence edge with the articles that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoOccurrenceEdge {
    articles: BTreeSet<String>,
}

impl CoOccurrenceEdge {
    /// Number of distinct articles exhibiting both languages
    pub fn weight(&self) -> u64 {
        self.articles.len() as u64
    }

    /// Contributing article identifiers, sorted
    pub fn articles(&self) -> impl Iterator<Item = &str> {
        self.articles.iter().map(String::as_str)
    }

    pub fn contains_article(&self, article_id: &str) -> bool {
        self.articles.contains(article_id)
    }
}

/// Undirected weighted graph over language codes
///
/// Nodes appear when first used as an edge endpoint and are never removed.
/// Iteration order is sorted, which keeps exports deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageGraph {
    nodes: BTreeSet<String>,
    edges: BTreeMap<LanguagePair, CoOccurrenceEdge>,
}

impl LanguageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one article's language set
    ///
    /// Returns the number of edges the article was newly added to.
    pub fn record_cooccurrence(&mut self, languages: &BTreeSet<String>, article_id: &str) -> usize {
        let codes: Vec<&String> = languages.iter().collect();
        let mut added = 0;

        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                let pair = LanguagePair::new(a.as_str(), b.as_str());
                let edge = self.edges.entry(pair).or_default();
                if edge.articles.insert(article_id.to_string()) {
                    added += 1;
                }
            }
        }

        if added > 0 {
            for code in &codes {
                if !self.nodes.contains(code.as_str()) {
                    self.nodes.insert((*code).clone());
                }
            }
        }

        added
    }

    /// Language codes, sorted
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Edges, sorted by pair
    pub fn edges(&self) -> impl Iterator<Item = (&LanguagePair, &CoOccurrenceEdge)> {
        self.edges.iter()
    }

    pub fn edge(&self, a: &str, b: &str) -> Option<&CoOccurrenceEdge> {
        self.edges.get(&LanguagePair::new(a, b))
    }

    /// Weight of the edge between `a` and `b`, or 0 if absent
    pub fn weight(&self, a: &str, b: &str) -> u64 {
        self.edge(a, b).map(CoOccurrenceEdge::weight).unwrap_or(0)
    }

    /// Codes adjacent to `code`, with edge weights
    pub fn neighbors<'a>(&'a self, code: &'a str) -> impl Iterator<Item = (&'a str, u64)> + 'a {
        self.edges.iter().filter_map(move |(pair, edge)| {
            if pair.first() == code {
                Some((pair.second(), edge.weight()))
            } else if pair.second() == code {
                Some((pair.first(), edge.weight()))
            } else {
                None
            }
        })
    }

    pub fn contains_node(&self, code: &str) -> bool {
        self.nodes.contains(code)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Thread-safe owner of the graph during a crawl
///
/// This is the single serialization point for results from concurrent fetch
/// tasks. Once finalized the graph is moved out and every further write is
/// rejected.
#[derive(Debug, Default)]
pub struct GraphAccumulator {
    inner: Mutex<AccumulatorState>,
}

#[derive(Debug, Default)]
struct AccumulatorState {
    graph: LanguageGraph,
    frozen: bool,
}

impl GraphAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one article's language set under the accumulator lock
    ///
    /// Sets with fewer than two codes add nothing.
    pub fn record_cooccurrence(
        &self,
        languages: &BTreeSet<String>,
        article_id: &str,
    ) -> Result<usize, RippleError> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if state.frozen {
            return Err(RippleError::GraphFrozen);
        }
        Ok(state.graph.record_cooccurrence(languages, article_id))
    }

    /// Freezes the accumulator and moves the graph out
    ///
    /// Returns `GraphFrozen` if called a second time.
    pub fn finalize(&self) -> Result<LanguageGraph, RippleError> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if state.frozen {
            return Err(RippleError::GraphFrozen);
        }
        state.frozen = true;
        Ok(std::mem::take(&mut state.graph))
    }

    pub fn is_frozen(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .frozen
    }
}
