//! URL handling module for Lang-Ripple
//!
//! This module provides canonicalization (the visited-set key), domain
//! restriction, and the article-link rules used to decide what to traverse.

mod domain;
mod normalize;

pub use domain::{extract_domain, AllowedDomain};
pub use normalize::{canonicalize, canonicalize_url};

use percent_encoding::percent_decode_str;
use url::Url;

/// Separator that marks non-article namespaces (`Category:`, `Talk:`, ...)
pub const NAMESPACE_SEPARATOR: char = ':';

/// Returns true if the URL path is an article page under `prefix`
///
/// The path must start with the prefix and must not contain a namespace
/// separator, either literal or percent-encoded.
///
/// # Examples
///
/// ```
/// use lang_ripple::url::is_article_url;
/// use url::Url;
///
/// let article = Url::parse("https://example.org/wiki/Linguistics").unwrap();
/// let category = Url::parse("https://example.org/wiki/Category:Linguistics").unwrap();
/// assert!(is_article_url(&article, "/wiki/"));
/// assert!(!is_article_url(&category, "/wiki/"));
/// ```
pub fn is_article_url(url: &Url, prefix: &str) -> bool {
    let path = url.path();
    match path.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() => {
            !rest.contains(NAMESPACE_SEPARATOR) && !rest.to_ascii_lowercase().contains("%3a")
        }
        _ => false,
    }
}

/// Derives the article identifier used as edge provenance
///
/// This is the percent-decoded path after `prefix`, or the whole path when
/// the prefix is absent.
pub fn article_id(url: &Url, prefix: &str) -> String {
    let path = url.path();
    let raw = path.strip_prefix(prefix).unwrap_or(path);
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
