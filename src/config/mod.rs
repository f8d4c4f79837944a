//! Configuration module for Lang-Ripple
//!
//! This module handles loading, parsing, and validating crawl configuration.
//! Two formats are understood: a TOML file (`.toml`) and the plain crawler
//! file, where the first line is the page budget, the second the allowed
//! domain, and every further non-blank line a seed URL.
//!
//! # Example
//!
//! ```no_run
//! use lang_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawl budget: {} pages", config.crawl.page_budget);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, OutputConfig, PolitenessConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_crawler_file, parse_toml,
};
pub use validation::validate;
