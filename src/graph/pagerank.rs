//! PageRank over a finalized language graph
//!
//! Power iteration on the undirected graph, treating every edge as a pair of
//! directed links. Unweighted by default, so each neighbour gets an equal
//! share; with `weighted` set, shares follow co-occurrence weights.

use crate::graph::LanguageGraph;
use crate::RippleError;
use std::collections::{BTreeMap, HashMap};

/// Tuning for the power iteration
#[derive(Debug, Clone, Copy)]
pub struct PageRankOptions {
    /// Probability of following a link rather than teleporting
    pub damping: f64,

    /// Iteration cap before giving up
    pub max_iterations: usize,

    /// Per-node convergence tolerance
    pub tolerance: f64,

    /// Weight transitions by edge weight
    pub weighted: bool,
}

impl Default for PageRankOptions {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1.0e-6,
            weighted: false,
        }
    }
}

/// Computes PageRank scores for every language in the graph
///
/// Scores sum to 1. An empty graph yields an empty map.
///
/// # Errors
///
/// `PageRankConvergence` if the L1 change does not drop below
/// `node_count * tolerance` within `max_iterations`.
pub fn compute_pagerank(
    graph: &LanguageGraph,
    options: &PageRankOptions,
) -> Result<BTreeMap<String, f64>, RippleError> {
    let nodes: Vec<&str> = graph.nodes().collect();
    let n = nodes.len();
    if n == 0 {
        return Ok(BTreeMap::new());
    }

    let index: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, c)| (*c, i)).collect();

    // Row-normalized transitions: links[u] = [(v, share)]
    let mut links: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for (pair, edge) in graph.edges() {
        let (Some(&u), Some(&v)) = (index.get(pair.first()), index.get(pair.second())) else {
            continue;
        };
        let w = if options.weighted {
            edge.weight() as f64
        } else {
            1.0
        };
        links[u].push((v, w));
        links[v].push((u, w));
    }
    for row in links.iter_mut() {
        let total: f64 = row.iter().map(|(_, w)| w).sum();
        if total > 0.0 {
            for (_, w) in row.iter_mut() {
                *w /= total;
            }
        }
    }

    let uniform = 1.0 / n as f64;
    let alpha = options.damping;
    let mut x = vec![uniform; n];

    for _ in 0..options.max_iterations {
        let last = x;
        x = vec![0.0; n];

        let dangling: f64 = alpha
            * links
                .iter()
                .zip(&last)
                .filter(|(row, _)| row.is_empty())
                .map(|(_, score)| score)
                .sum::<f64>();

        for (u, row) in links.iter().enumerate() {
            for &(v, share) in row {
                x[v] += alpha * last[u] * share;
            }
        }
        for score in x.iter_mut() {
            *score += dangling * uniform + (1.0 - alpha) * uniform;
        }

        let err: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if err < n as f64 * options.tolerance {
            return Ok(nodes
                .iter()
                .zip(x)
                .map(|(code, score)| (code.to_string(), score))
                .collect());
        }
    }

    Err(RippleError::PageRankConvergence {
        iterations: options.max_iterations,
    })
}

/// Sorts scores descending, ties broken by language code
pub fn ranked(scores: &BTreeMap<String, f64>) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = scores.iter().map(|(c, s)| (c.as_str(), *s)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}
