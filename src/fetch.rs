// src/fetch.rs
// =============================================================================
// This module downloads listing pages and API responses.
//
// Key functionality:
// - PageSource: the one thing the crawl loop needs from the network,
//   "give me the HTML behind this URL"
// - HttpFetcher: the real implementation on top of reqwest
// - Retries for transient failures (timeouts, connection resets, 5xx, 429)
//
// Every knob (timeout, retries, backoff, User-Agent) lives in FetchConfig
// and comes from the command line, so nothing about the network behavior
// is hidden inside the code.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;

/// Where listing pages (and article API responses) come from
///
/// The crawl and download loops are generic over this so the tests can feed it pages from
/// memory instead of the network.
#[async_trait]
pub trait PageSource {
    /// Returns the full body of `url` as text
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Network settings for HttpFetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout (connect + body)
    pub timeout: Duration,
    /// How many extra attempts a transient failure gets
    pub retries: u32,
    /// Base wait before a retry, multiplied by the attempt number
    pub retry_backoff: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_backoff: Duration::from_millis(500),
            user_agent: default_user_agent(),
        }
    }
}

// Wikimedia asks bots to identify themselves
pub fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Fetches pages over HTTP(S) with reqwest
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> reqwest::Result<Self> {
        // One client for the whole crawl so connections get reused
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    // A single GET without retries
    async fn fetch_once(&self, url: &Url) -> Result<String, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        response.text().await.map_err(request_error)
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        check_scheme(url)?;

        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(%url, bytes = body.len(), attempt, "fetched page");
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt < self.config.retries => {
                    attempt += 1;
                    let wait = self.config.retry_backoff * attempt;
                    warn!(%url, error = %e, attempt, wait_ms = wait.as_millis() as u64, "retrying");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Parses a listing page URL, accepting only absolute http(s) URLs
pub fn parse_page_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|source| FetchError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    check_scheme(&url)?;
    Ok(url)
}

fn check_scheme(url: &Url) -> Result<(), FetchError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::UnsupportedScheme {
            url: url.to_string(),
            scheme: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Answers the n-th connection with the n-th (status, body) pair, repeating
    // the last one, and counts how many requests came in
    async fn serve(responses: Vec<(u16, &'static str)>) -> (Url, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)];

                // Read the request head before answering
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(k) => request.extend_from_slice(&buf[..k]),
                    }
                }

                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (Url::parse(&format!("http://{}/", addr)).unwrap(), hits)
    }

    fn quick_fetcher(retries: u32) -> HttpFetcher {
        HttpFetcher::new(FetchConfig {
            timeout: Duration::from_secs(5),
            retries,
            retry_backoff: Duration::from_millis(1),
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_page_url_accepts_https() {
        let url = parse_page_url("https://hi.wikipedia.org/wiki/Special:AllPages").unwrap();
        assert_eq!(url.host_str(), Some("hi.wikipedia.org"));
    }

    #[test]
    fn test_parse_page_url_rejects_relative() {
        let err = parse_page_url("/wiki/Special:AllPages").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn test_parse_page_url_rejects_other_schemes() {
        let err = parse_page_url("file:///etc/passwd").unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_default_user_agent_names_the_tool() {
        assert!(default_user_agent().starts_with("wiki-allpages/"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        // Port 9 (discard) on localhost is essentially never listening
        let fetcher = HttpFetcher::new(FetchConfig {
            timeout: Duration::from_secs(2),
            retries: 0,
            ..FetchConfig::default()
        })
        .unwrap();

        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_success() {
        let (url, hits) = serve(vec![(503, ""), (200, "ok")]).await;

        let body = quick_fetcher(2).fetch(&url).await.unwrap();
        assert_eq!(body, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let (url, hits) = serve(vec![(404, "")]).await;

        let err = quick_fetcher(2).fetch(&url).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_stop_after_the_configured_attempts() {
        let (url, hits) = serve(vec![(503, "")]).await;

        let err = quick_fetcher(2).fetch(&url).await.unwrap_err();
        assert!(err.is_transient());
        // One attempt plus two retries
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
