//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The budgeted frontier and visited set
//! - HTTP fetching with retry logic and adaptive throttling
//! - Language and link extraction from article pages
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod result;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FetchedPage, Fetcher};
pub use frontier::{Frontier, FrontierEntry};
pub use parser::{process_page, PageRules, ProcessedPage};
pub use result::{CrawlCounters, CrawlResult, StopReason};
