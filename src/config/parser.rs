use crate::config::types::{Config, CrawlConfig, OutputConfig, PolitenessConfig, UserAgentConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Files ending in `.toml` are parsed as TOML; anything else is read as a
/// plain crawler file (see [`parse_crawler_file`]). Both are validated.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use lang_ripple::config::load_config;
///
/// let config = load_config(Path::new("seeds.txt")).unwrap();
/// println!("Allowed domain: {}", config.crawl.allowed_domain);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    let config = if is_toml {
        parse_toml(&content)?
    } else {
        parse_crawler_file(&content)?
    };

    validate(&config)?;

    Ok(config)
}

/// Parses a TOML configuration without validating it
pub fn parse_toml(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Parses the plain crawler file format without validating it
///
/// ```text
/// 100
/// https://en.wikipedia.org
/// https://en.wikipedia.org/wiki/Linguistics
/// https://en.wikipedia.org/wiki/Phonology
/// ```
///
/// Blank lines are ignored and every line is trimmed. Politeness, user agent
/// and output settings take their defaults.
pub fn parse_crawler_file(content: &str) -> Result<Config, ConfigError> {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());

    let budget_line = lines
        .next()
        .ok_or_else(|| ConfigError::Validation("crawler file is empty".to_string()))?;
    let page_budget = budget_line.parse::<u64>().map_err(|_| {
        ConfigError::Validation(format!(
            "first line must be a positive page budget, got '{}'",
            budget_line
        ))
    })?;

    let allowed_domain = lines
        .next()
        .ok_or_else(|| {
            ConfigError::Validation("crawler file is missing the allowed domain line".to_string())
        })?
        .to_string();

    let seeds = lines.map(str::to_string).collect();

    Ok(Config {
        crawl: CrawlConfig {
            page_budget,
            allowed_domain,
            seeds,
            base_language: "en".to_string(),
            article_prefix: "/wiki/".to_string(),
            max_duration_secs: None,
        },
        politeness: PolitenessConfig::default(),
        user_agent: UserAgentConfig::default(),
        output: OutputConfig::default(),
    })
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the exact file they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
