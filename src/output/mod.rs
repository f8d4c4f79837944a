//! Output module for exporting crawl results
//!
//! This module handles:
//! - Writing the finished language graph as GML or an edge list
//! - Loading a previously written GML graph
//! - Persisting PageRank scores
//! - Printing the post-crawl summary report

mod edge_list;
mod gml;
mod report;
mod traits;

pub use edge_list::{format_edge_list, EdgeListExporter, EDGE_LIST_HEADER};
pub use gml::{format_gml, parse_gml, read_gml, GmlExporter};
pub use report::{format_pagerank, format_report, print_report, write_pagerank};
pub use traits::{GraphExporter, OutputError, OutputResult};
