//! Lang-Ripple: a polite language-graph crawler
//!
//! This crate crawls an encyclopedia site under a hard page budget, reads the
//! language-alternate links of every article it visits, and accumulates an
//! undirected co-occurrence graph over language codes.

pub mod config;
pub mod crawler;
pub mod graph;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Lang-Ripple operations
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Invalid crawl phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Language graph is finalized and can no longer be mutated")]
    GraphFrozen,

    #[error("PageRank failed to converge after {iterations} iterations")]
    PageRankConvergence { iterations: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Failure of a single page fetch
///
/// Transient failures are retried by the fetcher; permanent ones are not.
/// Neither kind aborts the crawl.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Transient failure for {url}: {reason}")]
    Transient { url: String, reason: String },

    #[error("Permanent failure for {url}: {reason}")]
    Permanent { url: String, reason: String },
}

impl FetchError {
    pub fn transient(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transient {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn permanent(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Permanent {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Transient { url, .. } | Self::Permanent { url, .. } => url,
        }
    }
}

/// A fetched page could not be interpreted as HTML
#[derive(Debug, Clone, Error)]
#[error("HTML parse error for {url}: {message}")]
pub struct ParseError {
    pub url: String,
    pub message: String,
}

impl From<ParseError> for FetchError {
    fn from(err: ParseError) -> Self {
        FetchError::Permanent {
            url: err.url,
            reason: format!("parse error: {}", err.message),
        }
    }
}

/// Result type alias for Lang-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlResult, StopReason};
pub use graph::{GraphAccumulator, LanguageGraph, LanguagePair};
pub use state::CrawlPhase;
pub use url::{canonicalize, AllowedDomain};
