//! Crawl report and PageRank output
//!
//! The report is the human-readable summary printed after a crawl. PageRank
//! scores are persisted one `code score` line per language, best first.

use crate::crawler::CrawlResult;
use crate::graph::{ranked, LanguageGraph};
use crate::output::traits::OutputResult;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Languages listed in the report's connectivity table
const TOP_LANGUAGES: usize = 10;

/// Formats the crawl summary report
pub fn format_report(result: &CrawlResult) -> String {
    let counters = result.counters();
    let graph = result.graph();
    let mut report = String::new();

    report.push_str("=== Crawl Summary ===\n\n");

    report.push_str("Run:\n");
    report.push_str(&format!(
        "  Started: {}\n",
        result.started_at().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!(
        "  Finished: {}\n",
        result.finished_at().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    let millis = result.duration().num_milliseconds().max(0);
    report.push_str(&format!("  Duration: {:.2}s\n", millis as f64 / 1000.0));
    report.push_str(&format!("  Stop reason: {}\n\n", result.stop_reason()));

    report.push_str("Pages:\n");
    report.push_str(&format!("  Processed: {}\n", result.pages_processed()));
    report.push_str(&format!("  Succeeded: {}\n", counters.succeeded));
    report.push_str(&format!(
        "  Failed: {} ({} transient, {} permanent)\n",
        counters.failed(),
        counters.failed_transient,
        counters.failed_permanent
    ));
    let success_rate = if result.pages_processed() > 0 {
        (counters.succeeded as f64 / result.pages_processed() as f64) * 100.0
    } else {
        0.0
    };
    report.push_str(&format!("  Success rate: {:.1}%\n\n", success_rate));

    report.push_str("Language graph:\n");
    report.push_str(&format!("  Languages: {}\n", graph.node_count()));
    report.push_str(&format!("  Edges: {}\n", graph.edge_count()));

    let top = top_languages(graph, TOP_LANGUAGES);
    if !top.is_empty() {
        report.push_str("\nMost connected languages:\n");
        for (code, degree, strength) in top {
            report.push_str(&format!(
                "  {}: {} neighbors, {} shared articles\n",
                code, degree, strength
            ));
        }
    }

    report
}

/// Prints the crawl summary report to stdout
pub fn print_report(result: &CrawlResult) {
    print!("{}", format_report(result));
}

/// Languages by degree, then total edge weight, then code
fn top_languages(graph: &LanguageGraph, limit: usize) -> Vec<(&str, usize, u64)> {
    let mut languages: Vec<(&str, usize, u64)> = graph
        .nodes()
        .map(|code| {
            let (degree, strength) = graph
                .neighbors(code)
                .fold((0, 0), |(d, s), (_, weight)| (d + 1, s + weight));
            (code, degree, strength)
        })
        .collect();

    languages.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(a.0.cmp(b.0)));
    languages.truncate(limit);
    languages
}

/// Formats PageRank scores, highest first
pub fn format_pagerank(scores: &BTreeMap<String, f64>) -> String {
    ranked(scores)
        .into_iter()
        .map(|(code, score)| format!("{} {:.6}\n", code, score))
        .collect()
}

/// Writes PageRank scores to `path`
pub fn write_pagerank(scores: &BTreeMap<String, f64>, path: &Path) -> OutputResult<()> {
    let mut file = File::create(path)?;
    file.write_all(format_pagerank(scores).as_bytes())?;

    tracing::info!("Wrote PageRank for {} languages to {}", scores.len(), path.display());
    Ok(())
}
