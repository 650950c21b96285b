use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::feed::sources::{mirror_rss_url, SourceSpec};

/// Per-attempt bound covering connect, headers and body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; feedharvest/0.1; +https://github.com/dhofheinz/feedharvest)";

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving one feed document.
///
/// None of these abort a run; the orchestrator logs them and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Any status other than 200
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Attempt exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// 200 response whose body is empty or whitespace
    #[error("Empty response body")]
    EmptyBody,
    /// Not an absolute http(s) URL
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Every configured mirror failed for a mirror-backed source
    #[error("All {0} mirrors failed")]
    MirrorsExhausted(usize),
}

/// A mirror that was tried and skipped before the fetch settled.
#[derive(Debug)]
pub struct MirrorFailure {
    pub base: String,
    pub error: FetchError,
}

/// A successfully retrieved feed document.
#[derive(Debug)]
pub struct FetchedFeed {
    /// URL the body actually came from
    pub url: String,
    pub body: Vec<u8>,
    /// Mirrors that failed before `url` succeeded, in attempt order
    pub mirror_failures: Vec<MirrorFailure>,
}

/// Sequential HTTP fetcher with Nitter mirror fallback.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    mirrors: Vec<String>,
    timeout: Duration,
}

impl Fetcher {
    /// Builds a client carrying the fixed [`USER_AGENT`].
    pub fn new(mirrors: Vec<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, mirrors, timeout))
    }

    pub fn with_client(client: reqwest::Client, mirrors: Vec<String>, timeout: Duration) -> Self {
        Self {
            client,
            mirrors,
            timeout,
        }
    }

    /// Retrieves the document for one source.
    ///
    /// Sources with a `mirror_key` walk the mirror list in order and settle on
    /// the first 200 with a non-blank body; each failed mirror is logged and
    /// recorded. Other sources get a single attempt against their own URL.
    ///
    /// # Errors
    ///
    /// - [`FetchError::MirrorsExhausted`] when every mirror failed
    /// - any single-attempt error for plain sources
    pub async fn fetch(&self, source: &SourceSpec) -> Result<FetchedFeed, FetchError> {
        let Some(handle) = source.mirror_key.as_deref() else {
            let body = self.fetch_url(&source.url).await.inspect_err(|e| {
                tracing::warn!(url = %source.url, error = %e, "Fetch failed");
            })?;
            return Ok(FetchedFeed {
                url: source.url.clone(),
                body,
                mirror_failures: Vec::new(),
            });
        };

        let mut mirror_failures = Vec::new();
        for base in &self.mirrors {
            let url = mirror_rss_url(base, handle);
            match self.fetch_url(&url).await {
                Ok(body) => {
                    if !mirror_failures.is_empty() {
                        tracing::info!(
                            handle = %handle,
                            mirror = %base,
                            skipped = mirror_failures.len(),
                            "Nitter mirror fallback succeeded"
                        );
                    }
                    return Ok(FetchedFeed {
                        url,
                        body,
                        mirror_failures,
                    });
                }
                Err(error) => {
                    tracing::warn!(mirror = %base, handle = %handle, error = %error, "Nitter mirror failed");
                    mirror_failures.push(MirrorFailure {
                        base: base.clone(),
                        error,
                    });
                }
            }
        }

        Err(FetchError::MirrorsExhausted(mirror_failures.len()))
    }

    /// One bounded GET. Succeeds only on status 200 with a non-blank body.
    pub async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "{url}: unsupported scheme {}",
                parsed.scheme()
            )));
        }

        tokio::time::timeout(self.timeout, self.attempt(parsed))
            .await
            .map_err(|_| FetchError::Timeout)?
    }

    async fn attempt(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_body(response, MAX_FEED_SIZE).await
    }
}

/// Collects a feed body of at most `limit` bytes that is not all whitespace.
async fn read_body(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(FetchError::ResponseTooLarge);
    }

    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        body.extend_from_slice(&chunk?);
        if body.len() > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FetchError::EmptyBody);
    }
    Ok(body)
}
