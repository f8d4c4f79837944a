use crate::UrlError;
use url::Url;

/// Canonicalizes a URL for visited-set membership
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only HTTP and HTTPS
/// 3. Require a host (the `url` crate lowercases it)
/// 4. Remove the fragment (everything after #)
///
/// Paths and queries are kept verbatim: article titles are case-sensitive and
/// two spellings of a path can be two different articles.
///
/// # Examples
///
/// ```
/// use lang_ripple::url::canonicalize;
///
/// let url = canonicalize("https://EN.Wikipedia.org/wiki/Rust#History").unwrap();
/// assert_eq!(url.as_str(), "https://en.wikipedia.org/wiki/Rust");
/// ```
pub fn canonicalize(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize_url(url)
}

/// Same as [`canonicalize`], for an already parsed URL
pub fn canonicalize_url(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    Ok(url)
}
