use serde::Deserialize;

/// Main configuration structure for Lang-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to crawl and how far
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of pages the crawl may visit
    #[serde(rename = "page-budget")]
    pub page_budget: u64,

    /// Host (or URL whose host is used) that every fetch must stay on
    #[serde(rename = "allowed-domain")]
    pub allowed_domain: String,

    /// Start URLs, fetched in order
    pub seeds: Vec<String>,

    /// Language code added to every page's language set
    #[serde(rename = "base-language", default = "default_base_language")]
    pub base_language: String,

    /// Path prefix that marks article pages
    #[serde(rename = "article-prefix", default = "default_article_prefix")]
    pub article_prefix: String,

    /// Optional wall-clock ceiling for the whole crawl
    #[serde(rename = "max-duration-secs", default)]
    pub max_duration_secs: Option<u64>,
}

/// Politeness toward the remote server
#[derive(Debug, Clone, Deserialize)]
pub struct PolitenessConfig {
    /// Maximum number of fetches in flight
    #[serde(rename = "max-concurrent-fetches", default = "default_max_concurrent")]
    pub max_concurrent_fetches: u32,

    /// Minimum delay between fetches (milliseconds)
    #[serde(rename = "download-delay-ms", default = "default_download_delay")]
    pub download_delay_ms: u64,

    /// Ceiling the adaptive delay may escalate to (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Responses slower than this count as slow (milliseconds)
    #[serde(rename = "slow-response-ms", default = "default_slow_response")]
    pub slow_response_ms: u64,

    /// Consecutive slow responses before the delay doubles
    #[serde(rename = "escalate-after", default = "default_escalate_after")]
    pub escalate_after: u32,

    /// Consecutive fast responses before the delay halves
    #[serde(rename = "deescalate-after", default = "default_deescalate_after")]
    pub deescalate_after: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Total attempts per URL, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry; doubled on each further retry (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent(),
            download_delay_ms: default_download_delay(),
            max_delay_ms: default_max_delay(),
            slow_response_ms: default_slow_response(),
            escalate_after: default_escalate_after(),
            deescalate_after: default_deescalate_after(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "LanguageGraphBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "bot@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Where the finished graph goes
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// GML graph file
    #[serde(rename = "graph-path", default)]
    pub graph_path: Option<String>,

    /// `lang1,lang2,weight` edge list
    #[serde(rename = "edge-list-path", default)]
    pub edge_list_path: Option<String>,

    /// PageRank scores, one `code score` line per language
    #[serde(rename = "pagerank-path", default)]
    pub pagerank_path: Option<String>,

    /// PageRank damping factor
    #[serde(default = "default_damping")]
    pub damping: f64,

    /// Use edge weights as PageRank transition weights
    #[serde(rename = "weighted-pagerank", default)]
    pub weighted_pagerank: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            graph_path: None,
            edge_list_path: None,
            pagerank_path: None,
            damping: default_damping(),
            weighted_pagerank: false,
        }
    }
}

fn default_base_language() -> String {
    "en".to_string()
}

fn default_article_prefix() -> String {
    "/wiki/".to_string()
}

fn default_max_concurrent() -> u32 {
    1
}

fn default_download_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    2000
}

fn default_slow_response() -> u64 {
    1000
}

fn default_escalate_after() -> u32 {
    2
}

fn default_deescalate_after() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_damping() -> f64 {
    0.85
}
