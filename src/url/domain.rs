use crate::UrlError;
use url::Url;

/// The single host a crawl is restricted to
///
/// Built from either a bare host (`en.wikipedia.org`) or a URL whose host is
/// used (`https://en.wikipedia.org`). Matching is exact and case-insensitive;
/// subdomains are not included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedDomain {
    host: String,
}

impl AllowedDomain {
    /// Parses a domain setting into an allowed host
    ///
    /// # Examples
    ///
    /// ```
    /// use lang_ripple::url::AllowedDomain;
    ///
    /// let domain = AllowedDomain::parse("https://EN.wikipedia.org").unwrap();
    /// assert_eq!(domain.host(), "en.wikipedia.org");
    /// ```
    pub fn parse(value: &str) -> Result<Self, UrlError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(UrlError::MissingDomain);
        }

        let host = if value.contains("://") {
            let url = Url::parse(value).map_err(|e| UrlError::Parse(e.to_string()))?;
            extract_domain(&url).ok_or(UrlError::MissingDomain)?
        } else {
            value.trim_end_matches('/').to_lowercase()
        };

        if host.is_empty()
            || !host
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
            || host.starts_with('.')
            || host.ends_with('.')
            || host.contains("..")
        {
            return Err(UrlError::Parse(format!("invalid host '{}'", host)));
        }

        Ok(Self { host })
    }

    /// The lowercase host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns true if the URL's host is exactly the allowed host
    pub fn permits(&self, url: &Url) -> bool {
        url.host_str()
            .map(|h| h.eq_ignore_ascii_case(&self.host))
            .unwrap_or(false)
    }
}

/// Extracts the lowercase host of a URL
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
