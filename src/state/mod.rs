//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: The orchestrator lifecycle (seeding, running, draining, finalized)
//! - `Throttle`: Adaptive inter-request delay toward the crawled host

mod crawl_phase;
mod throttle;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use throttle::Throttle;
