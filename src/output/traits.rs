//! Exporter traits and error types
//!
//! Every graph export format implements `GraphExporter`; writing to disk is
//! shared so each format only has to render text.

use crate::graph::LanguageGraph;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("Failed to parse graph: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A file format for the finished language graph
pub trait GraphExporter {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Renders the whole graph
    fn render(&self, graph: &LanguageGraph) -> OutputResult<String>;

    /// Renders the graph and writes it to `path`, replacing any existing file
    fn export(&self, graph: &LanguageGraph, path: &Path) -> OutputResult<()> {
        let text = self.render(graph)?;

        let mut file = File::create(path)?;
        file.write_all(text.as_bytes())?;

        tracing::info!(
            "Wrote {} export ({} nodes, {} edges) to {}",
            self.name(),
            graph.node_count(),
            graph.edge_count(),
            path.display()
        );
        Ok(())
    }
}
