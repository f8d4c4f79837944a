//! Language graph module
//!
//! - `accumulator`: the co-occurrence graph and its thread-safe owner
//! - `pagerank`: importance scores over a finalized graph

mod accumulator;
pub mod pagerank;

pub use accumulator::{CoOccurrenceEdge, GraphAccumulator, LanguageGraph, LanguagePair};
pub use pagerank::{compute_pagerank, ranked, PageRankOptions};
