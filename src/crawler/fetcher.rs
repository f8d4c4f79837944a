//! HTTP fetcher and politeness controller
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Rejecting off-domain URLs and redirect targets before any network call
//! - Capping in-flight fetches with a semaphore
//! - Pacing fetches through the adaptive throttle
//! - Retry logic for transient failures
//! - Error classification

use crate::config::{PolitenessConfig, UserAgentConfig};
use crate::state::Throttle;
use crate::url::AllowedDomain;
use crate::FetchError;
use reqwest::header::LOCATION;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use url::Url;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: Url,

    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value
    pub content_type: String,

    /// Raw page body
    pub body: Vec<u8>,

    /// Time spent on the successful attempt
    pub elapsed: Duration,

    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use lang_ripple::config::{PolitenessConfig, UserAgentConfig};
/// use lang_ripple::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &PolitenessConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    politeness: &PolitenessConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(politeness.request_timeout_secs))
        .connect_timeout(Duration::from_secs(politeness.request_timeout_secs.min(10)))
        .redirect(Policy::none()) // Redirects are followed by the fetcher
        .gzip(true)
        .brotli(true)
        .build()
}

/// Polite fetcher restricted to a single host
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Off-domain URL or redirect target | Immediate → permanent |
/// | Redirect loop / more than 10 hops | Immediate → permanent |
/// | HTTP 404 / other 4xx | Immediate → permanent |
/// | Non-HTML Content-Type | Immediate → permanent |
/// | Connection refused | Immediate → permanent |
/// | HTTP 429 / 5xx | Retry with backoff → transient |
/// | Timeout | Retry with backoff → transient |
///
/// Every attempt, retries included, waits for a throttle slot first.
pub struct Fetcher {
    client: Client,
    allowed_domain: AllowedDomain,
    semaphore: Semaphore,
    max_concurrency: usize,
    throttle: Mutex<Throttle>,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl Fetcher {
    pub fn new(client: Client, allowed_domain: AllowedDomain, config: &PolitenessConfig) -> Self {
        let max_concurrency = config.max_concurrent_fetches.max(1) as usize;
        Self {
            client,
            allowed_domain,
            semaphore: Semaphore::new(max_concurrency),
            max_concurrency,
            throttle: Mutex::new(Throttle::new(config)),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Maximum number of fetches allowed in flight
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Delay currently enforced between fetches
    pub fn current_delay(&self) -> Duration {
        self.throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current_delay
    }

    /// Fetches a URL with domain restriction, pacing and retries
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        if !self.allowed_domain.permits(url) {
            return Err(FetchError::permanent(
                url.as_str(),
                format!("host is outside allowed domain {}", self.allowed_domain.host()),
            ));
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FetchError::permanent(url.as_str(), "fetcher is closed"))?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.wait_for_slot().await;

            match self.fetch_once(url).await {
                Ok(mut page) => {
                    page.attempts = attempt;
                    return Ok(page);
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let backoff = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        "Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Waits until the throttle allows the next request to start
    async fn wait_for_slot(&self) {
        let wait = {
            let mut throttle = self.throttle.lock().unwrap_or_else(PoisonError::into_inner);
            throttle.reserve_slot(Instant::now())
        };
        if !wait.is_zero() {
            tracing::trace!("Politeness delay: {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn record_response(&self, started: Instant, overloaded: bool) {
        let now = Instant::now();
        let mut throttle = self.throttle.lock().unwrap_or_else(PoisonError::into_inner);
        throttle.record_response(now.duration_since(started), overloaded, now);
    }

    /// Sends a GET and follows same-domain redirects by hand
    ///
    /// Every hop is checked against the allowed domain before it is
    /// requested. Returns the final response and its URL.
    async fn send_following_redirects(
        &self,
        url: &Url,
        started: Instant,
    ) -> Result<(Response, Url), FetchError> {
        let mut current = url.clone();
        let mut seen = HashSet::new();
        seen.insert(current.as_str().to_string());

        for _ in 0..=MAX_REDIRECTS {
            let response = match self.client.get(current.clone()).send().await {
                Ok(response) => response,
                Err(e) => {
                    self.record_response(started, e.is_timeout());
                    return Err(classify_request_error(url, &e));
                }
            };

            if !response.status().is_redirection() {
                return Ok((response, current));
            }
            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return Ok((response, current));
            };

            let mut next = current.join(location).map_err(|e| {
                FetchError::permanent(url.as_str(), format!("invalid redirect target: {}", e))
            })?;
            next.set_fragment(None);

            if !self.allowed_domain.permits(&next) {
                self.record_response(started, false);
                return Err(FetchError::permanent(
                    url.as_str(),
                    format!("redirected off-domain to {}", next),
                ));
            }
            if !seen.insert(next.as_str().to_string()) {
                self.record_response(started, false);
                return Err(FetchError::permanent(
                    url.as_str(),
                    format!("redirect loop at {}", next),
                ));
            }

            tracing::debug!("Following redirect {} -> {}", current, next);
            current = next;
        }

        self.record_response(started, false);
        Err(FetchError::permanent(
            url.as_str(),
            format!("more than {} redirects", MAX_REDIRECTS),
        ))
    }

    /// A single request, classified into a page or a fetch error
    async fn fetch_once(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let started = Instant::now();

        let (response, final_url) = self.send_following_redirects(url, started).await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            self.record_response(started, true);
            return Err(FetchError::transient(
                url.as_str(),
                format!("HTTP {}", status.as_u16()),
            ));
        }

        if !status.is_success() {
            self.record_response(started, false);
            return Err(FetchError::permanent(
                url.as_str(),
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            self.record_response(started, false);
            return Err(FetchError::permanent(
                url.as_str(),
                format!("expected HTML, got '{}'", content_type),
            ));
        }

        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => {
                self.record_response(started, e.is_timeout());
                return Err(FetchError::transient(
                    url.as_str(),
                    format!("failed reading body: {}", e),
                ));
            }
        };

        let elapsed = started.elapsed();
        self.record_response(started, false);

        Ok(FetchedPage {
            url: url.clone(),
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
            elapsed,
            attempts: 1,
        })
    }
}

/// Returns true for HTML content types
fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Classifies a transport-level request error
fn classify_request_error(url: &Url, e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::transient(url.as_str(), "request timeout")
    } else if e.is_connect() {
        FetchError::permanent(url.as_str(), format!("connection failed: {}", e))
    } else {
        FetchError::transient(url.as_str(), e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_politeness() -> PolitenessConfig {
        PolitenessConfig {
            download_delay_ms: 0,
            max_delay_ms: 50,
            retry_backoff_ms: 1,
            max_attempts: 3,
            request_timeout_secs: 5,
            ..PolitenessConfig::default()
        }
    }

    fn fetcher_for(server: &MockServer, config: &PolitenessConfig) -> Fetcher {
        let client = build_http_client(&UserAgentConfig::default(), config).unwrap();
        let domain = AllowedDomain::parse(&server.uri()).unwrap();
        Fetcher::new(client, domain, config)
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), &PolitenessConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html"));
        assert!(is_html("text/html; charset=UTF-8"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("application/json"));
        assert!(!is_html("image/png"));
        assert!(!is_html(""));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/A"))
            .respond_with(html("<html>A</html>"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, &fast_politeness());
        let url = Url::parse(&format!("{}/wiki/A", server.uri())).unwrap();
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.status_code, 200);
        assert_eq!(page.body, b"<html>A</html>".to_vec());
        assert_eq!(page.attempts, 1);
    }

    #[tokio::test]
    async fn test_404_is_permanent_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, &fast_politeness());
        let url = Url::parse(&format!("{}/wiki/Missing", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_non_html_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Logo.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![0x89, 0x50]),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, &fast_politeness());
        let url = Url::parse(&format!("{}/wiki/Logo.png", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Permanent { .. }));
    }

    #[tokio::test]
    async fn test_server_error_retried_until_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, &fast_politeness());
        let url = Url::parse(&format!("{}/wiki/Flaky", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Recovering"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wiki/Recovering"))
            .respond_with(html("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, &fast_politeness());
        let url = Url::parse(&format!("{}/wiki/Recovering", server.uri())).unwrap();
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.attempts, 2);
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Slow"))
            .respond_with(html("<html>late</html>").set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = PolitenessConfig {
            request_timeout_secs: 1,
            max_attempts: 1,
            ..fast_politeness()
        };
        let fetcher = fetcher_for(&server, &config);
        let url = Url::parse(&format!("{}/wiki/Slow", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_off_domain_rejected_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html("<html></html>"))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, &fast_politeness());
        let url = Url::parse("https://elsewhere.example.net/wiki/A").unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Permanent { .. }));
        assert_eq!(err.url(), "https://elsewhere.example.net/wiki/A");
    }

    #[tokio::test]
    async fn test_same_domain_redirect_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/wiki/New#Top"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wiki/New"))
            .respond_with(html("<html>new</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, &fast_politeness());
        let url = Url::parse(&format!("{}/wiki/Old", server.uri())).unwrap();
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.url, url);
        assert_eq!(page.final_url.path(), "/wiki/New");
        assert_eq!(page.final_url.fragment(), None);
    }

    #[tokio::test]
    async fn test_off_domain_redirect_never_requested() {
        let server = MockServer::start().await;
        let elsewhere = MockServer::start().await;
        let port = Url::parse(&elsewhere.uri()).unwrap().port().unwrap();

        Mock::given(method("GET"))
            .and(path("/wiki/R"))
            .respond_with(ResponseTemplate::new(302).insert_header(
                "Location",
                format!("http://localhost:{}/wiki/Elsewhere", port).as_str(),
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(html("<html></html>"))
            .expect(0)
            .mount(&elsewhere)
            .await;

        let fetcher = fetcher_for(&server, &fast_politeness());
        let url = Url::parse(&format!("{}/wiki/R", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Permanent { .. }));
        assert!(elsewhere.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redirect_loop_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Ping"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/wiki/Pong"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wiki/Pong"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/wiki/Ping"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, &fast_politeness());
        let url = Url::parse(&format!("{}/wiki/Ping", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(!err.is_transient());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_overload_escalates_delay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = PolitenessConfig {
            download_delay_ms: 1,
            max_delay_ms: 40,
            escalate_after: 2,
            max_attempts: 2,
            ..fast_politeness()
        };
        let fetcher = fetcher_for(&server, &config);
        let url = Url::parse(&format!("{}/wiki/Busy", server.uri())).unwrap();
        let _ = fetcher.fetch(&url).await;

        assert_eq!(fetcher.current_delay(), Duration::from_millis(2));
    }
}
