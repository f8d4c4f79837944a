//! Page processor
//!
//! Turns a fetched article into the two things the crawl needs:
//! - the set of language codes it is available in (`<a hreflang="...">`),
//!   always including the base language
//! - the same-domain article links to traverse next
//!
//! A page may carry any number of languages.

use crate::url::{article_id, is_article_url, AllowedDomain};
use crate::ParseError;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// Rules that decide what counts as a language and an article link
#[derive(Debug, Clone)]
pub struct PageRules {
    /// Code added to every page's language set
    pub base_language: String,

    /// Path prefix of article pages
    pub article_prefix: String,

    /// Host that outbound links must stay on
    pub allowed_domain: AllowedDomain,
}

/// Extracted information from an article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPage {
    /// Identifier recorded as edge provenance
    pub article_id: String,

    /// Language codes, base language included
    pub languages: BTreeSet<String>,

    /// Canonical same-domain article links, in document order
    pub links: Vec<Url>,
}

impl ProcessedPage {
    /// Returns true if the page has enough languages to form an edge
    pub fn has_cooccurrence(&self) -> bool {
        self.languages.len() >= 2
    }
}

/// Processes a fetched page body
///
/// # Arguments
///
/// * `url` - Final URL of the page, used to resolve relative links
/// * `body` - Raw response body
/// * `rules` - Language and link rules for this crawl
///
/// # Returns
///
/// * `Ok(ProcessedPage)` - Languages and outbound links
/// * `Err(ParseError)` - The body is not UTF-8 text
///
/// # Example
///
/// ```
/// use lang_ripple::crawler::{process_page, PageRules};
/// use lang_ripple::url::AllowedDomain;
/// use url::Url;
///
/// let rules = PageRules {
///     base_language: "en".to_string(),
///     article_prefix: "/wiki/".to_string(),
///     allowed_domain: AllowedDomain::parse("example.org").unwrap(),
/// };
/// let html = r#"<a hreflang="fr" href="https://fr.example.org/wiki/A">Français</a>
///               <a href="/wiki/B">B</a>"#;
/// let url = Url::parse("https://example.org/wiki/A").unwrap();
/// let page = process_page(&url, html.as_bytes(), &rules).unwrap();
/// assert_eq!(page.languages.len(), 2);
/// assert_eq!(page.links[0].as_str(), "https://example.org/wiki/B");
/// ```
pub fn process_page(url: &Url, body: &[u8], rules: &PageRules) -> Result<ProcessedPage, ParseError> {
    let html = std::str::from_utf8(body).map_err(|e| ParseError {
        url: url.to_string(),
        message: format!("body is not valid UTF-8: {}", e),
    })?;

    let document = Html::parse_document(html);

    let mut languages = extract_languages(&document);
    languages.insert(rules.base_language.clone());

    let links = extract_article_links(&document, url, rules);

    Ok(ProcessedPage {
        article_id: article_id(url, &rules.article_prefix),
        languages,
        links,
    })
}

/// Collects every non-empty `hreflang` value on anchor elements
fn extract_languages(document: &Html) -> BTreeSet<String> {
    let mut languages = BTreeSet::new();

    if let Ok(selector) = Selector::parse("a[hreflang]") {
        for element in document.select(&selector) {
            if let Some(lang) = element.value().attr("hreflang") {
                let lang = lang.trim();
                if !lang.is_empty() {
                    languages.insert(lang.to_string());
                }
            }
        }
    }

    languages
}

/// Collects same-domain article links, deduplicated in document order
fn extract_article_links(document: &Html, base_url: &Url, rules: &PageRules) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(url) = resolve_link(href, base_url) else {
                continue;
            };

            if !rules.allowed_domain.permits(&url) {
                continue;
            }
            if !is_article_url(&url, &rules.article_prefix) {
                continue;
            }

            if seen.insert(url.as_str().to_string()) {
                links.push(url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute, fragment-free URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url)
}
