//! Lang-Ripple main entry point
//!
//! This is the command-line interface for the Lang-Ripple language-graph
//! crawler.

use anyhow::Context;
use clap::Parser;
use lang_ripple::config::{load_config_with_hash, validate, Config};
use lang_ripple::graph::{compute_pagerank, PageRankOptions};
use lang_ripple::output::{
    format_pagerank, print_report, read_gml, write_pagerank, EdgeListExporter, GmlExporter,
    GraphExporter,
};
use lang_ripple::{Coordinator, CrawlResult};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Lang-Ripple: a polite language-graph crawler
///
/// Lang-Ripple crawls one encyclopedia site breadth-first under a page
/// budget, records which languages each article is available in, and builds
/// an undirected co-occurrence graph over language codes. With `--input`
/// it skips the crawl and ranks a graph saved by an earlier run.
#[derive(Parser, Debug)]
#[command(name = "lang-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A polite language-graph crawler", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(
        value_name = "CONFIG",
        required_unless_present = "input",
        conflicts_with = "input"
    )]
    config: Option<PathBuf>,

    /// Rank a GML graph written by an earlier crawl instead of crawling
    #[arg(long, value_name = "GML", conflicts_with = "dry_run")]
    input: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Write the graph as GML to this path
    #[arg(long, value_name = "PATH")]
    graph_out: Option<PathBuf>,

    /// Write the graph as a lang1,lang2,weight edge list to this path
    #[arg(long, value_name = "PATH")]
    edges_out: Option<PathBuf>,

    /// Compute PageRank and write the ranking to this path
    #[arg(long, value_name = "PATH")]
    pagerank_out: Option<PathBuf>,

    /// PageRank damping factor
    #[arg(long, value_name = "D")]
    damping: Option<f64>,

    /// Weight PageRank transitions by co-occurrence counts
    #[arg(long)]
    weighted: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(input) = &cli.input {
        return handle_input(input, &cli);
    }
    let Some(config_path) = &cli.config else {
        anyhow::bail!("either CONFIG or --input is required");
    };

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", config_path.display());
    let (mut config, config_hash) = load_config_with_hash(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration after command-line overrides")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let result = handle_crawl(config.clone()).await?;

    if !cli.quiet {
        print_report(&result);
    }

    write_exports(&config, &result)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lang_ripple=info,warn"),
            1 => EnvFilter::new("lang_ripple=debug,info"),
            2 => EnvFilter::new("lang_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line flags win over the `[output]` table
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(path) = &cli.graph_out {
        config.output.graph_path = Some(path.display().to_string());
    }
    if let Some(path) = &cli.edges_out {
        config.output.edge_list_path = Some(path.display().to_string());
    }
    if let Some(path) = &cli.pagerank_out {
        config.output.pagerank_path = Some(path.display().to_string());
    }
    if let Some(damping) = cli.damping {
        config.output.damping = damping;
    }
    if cli.weighted {
        config.output.weighted_pagerank = true;
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Lang-Ripple Dry Run ===\n");

    println!("Crawl:");
    println!("  Allowed domain: {}", config.crawl.allowed_domain);
    println!("  Page budget: {}", config.crawl.page_budget);
    println!("  Base language: {}", config.crawl.base_language);
    println!("  Article prefix: {}", config.crawl.article_prefix);
    if let Some(limit) = config.crawl.max_duration_secs {
        println!("  Time limit: {}s", limit);
    }

    println!("\nPoliteness:");
    println!(
        "  Max concurrent fetches: {}",
        config.politeness.max_concurrent_fetches
    );
    println!(
        "  Download delay: {}ms (up to {}ms when throttled)",
        config.politeness.download_delay_ms, config.politeness.max_delay_ms
    );
    println!(
        "  Request timeout: {}s, {} attempts",
        config.politeness.request_timeout_secs, config.politeness.max_attempts
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    print_output_path("GML", &config.output.graph_path);
    print_output_path("Edge list", &config.output.edge_list_path);
    print_output_path("PageRank", &config.output.pagerank_path);

    println!("\nSeeds ({}):", config.crawl.seeds.len());
    for seed in &config.crawl.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl at most {} pages from {} seed URLs",
        config.crawl.page_budget,
        config.crawl.seeds.len()
    );
}

fn print_output_path(label: &str, path: &Option<String>) {
    match path {
        Some(path) => println!("  {}: {}", label, path),
        None => println!("  {}: (not written)", label),
    }
}

/// Handles the --input mode: PageRank over a saved graph
///
/// The ranking goes to `--pagerank-out` when given, stdout otherwise. The
/// other export flags re-export the loaded graph.
fn handle_input(input: &Path, cli: &Cli) -> anyhow::Result<()> {
    let graph = read_gml(input)
        .with_context(|| format!("failed to load graph from {}", input.display()))?;

    let options = PageRankOptions {
        damping: cli.damping.unwrap_or(PageRankOptions::default().damping),
        weighted: cli.weighted,
        ..PageRankOptions::default()
    };
    anyhow::ensure!(
        options.damping > 0.0 && options.damping < 1.0,
        "damping must be in (0, 1), got {}",
        options.damping
    );

    let scores = compute_pagerank(&graph, &options)?;
    match &cli.pagerank_out {
        Some(path) => write_pagerank(&scores, path)
            .with_context(|| format!("failed to write PageRank to {}", path.display()))?,
        None => print!("{}", format_pagerank(&scores)),
    }

    if let Some(path) = &cli.graph_out {
        GmlExporter
            .export(&graph, path)
            .with_context(|| format!("failed to write GML to {}", path.display()))?;
    }

    if let Some(path) = &cli.edges_out {
        EdgeListExporter
            .export(&graph, path)
            .with_context(|| format!("failed to write edge list to {}", path.display()))?;
    }

    Ok(())
}

/// Handles the main crawl operation
///
/// Ctrl-C stops dispatching new fetches; the crawl still drains and returns
/// the partial graph.
async fn handle_crawl(config: Config) -> anyhow::Result<CrawlResult> {
    let coordinator = Coordinator::new(config).context("failed to set up crawl")?;

    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight fetches");
            cancel.cancel();
        }
    });

    match coordinator.run().await {
        Ok(result) => {
            tracing::info!("Crawl completed ({})", result.stop_reason());
            Ok(result)
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Writes every export the configuration asks for
fn write_exports(config: &Config, result: &CrawlResult) -> anyhow::Result<()> {
    let graph = result.graph();

    if let Some(path) = &config.output.graph_path {
        GmlExporter
            .export(graph, Path::new(path))
            .with_context(|| format!("failed to write GML to {}", path))?;
    }

    if let Some(path) = &config.output.edge_list_path {
        EdgeListExporter
            .export(graph, Path::new(path))
            .with_context(|| format!("failed to write edge list to {}", path))?;
    }

    if let Some(path) = &config.output.pagerank_path {
        let options = PageRankOptions {
            damping: config.output.damping,
            weighted: config.output.weighted_pagerank,
            ..PageRankOptions::default()
        };
        let scores = compute_pagerank(graph, &options)?;
        write_pagerank(&scores, Path::new(path))
            .with_context(|| format!("failed to write PageRank to {}", path))?;
    }

    Ok(())
}
