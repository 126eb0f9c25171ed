use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a feed document or an article page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// HTTP fetcher for feed documents and entry article pages.
///
/// Holds two clients with different redirect policies: the feed client
/// follows redirects (feeds commonly move behind 301s), while the article
/// client does not — a redirected article URL surfaces as
/// [`FetchError::HttpStatus`] and the entry is skipped by the pipeline.
#[derive(Clone)]
pub struct Fetcher {
    feed_client: reqwest::Client,
    article_client: reqwest::Client,
    timeout: Duration,
    max_body_bytes: usize,
}

impl Fetcher {
    /// Build a fetcher with the given per-request timeout and body size limit.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if a client cannot be constructed (TLS
    /// backend initialisation failure).
    pub fn new(timeout: Duration, max_body_bytes: usize) -> Result<Self, reqwest::Error> {
        let feed_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        let article_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            feed_client,
            article_client,
            timeout,
            max_body_bytes,
        })
    }

    /// Fetch a feed document, following redirects.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetch_with(&self.feed_client, url).await
    }

    /// Fetch an entry's article page. Redirects are not followed; a 3xx
    /// response is reported as an HTTP status error.
    pub async fn fetch_article(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetch_with(&self.article_client, url).await
    }

    // The timeout covers the whole exchange, headers and body: a server
    // that answers 200 and then stalls mid-body must not hold the batch.
    async fn fetch_with(
        &self,
        client: &reqwest::Client,
        url: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let limit = self.max_body_bytes;
        tokio::time::timeout(self.timeout, async move {
            let response = client.get(url).send().await.map_err(FetchError::Network)?;

            if !response.status().is_success() {
                return Err(FetchError::HttpStatus(response.status().as_u16()));
            }

            read_limited_bytes(response, limit).await
        })
        .await
        .map_err(|_| FetchError::Timeout)?
    }
}

/// Read a response body up to `limit` bytes, streaming so an oversized body
/// is rejected without buffering it whole.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
