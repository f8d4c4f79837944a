//! Edge-list CSV export
//!
//! One `lang1,lang2,weight` record per edge, sorted by pair. Language codes
//! come straight from page markup, so fields are quoted whenever needed.

use crate::graph::LanguageGraph;
use crate::output::traits::{GraphExporter, OutputError, OutputResult};

/// Header record of the edge list
pub const EDGE_LIST_HEADER: [&str; 3] = ["lang1", "lang2", "weight"];

/// Edge-list exporter
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeListExporter;

impl GraphExporter for EdgeListExporter {
    fn name(&self) -> &'static str {
        "edge list"
    }

    fn render(&self, graph: &LanguageGraph) -> OutputResult<String> {
        format_edge_list(graph)
    }
}

/// Formats a language graph as an edge list
pub fn format_edge_list(graph: &LanguageGraph) -> OutputResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EDGE_LIST_HEADER)?;

    for (pair, edge) in graph.edges() {
        let weight = edge.weight().to_string();
        writer.write_record([pair.first(), pair.second(), weight.as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| OutputError::Format(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Format(e.to_string()))
}
