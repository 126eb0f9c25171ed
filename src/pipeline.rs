//! The enrichment pipeline: feed document in, ordered full-text items out.
//!
//! One fetch→extract→rewrite task runs per feed entry, fanned out over a
//! bounded number of concurrent fetches. Entry failures are isolated: a dead
//! article link yields an item with empty content, never a failed run. Only
//! feed-level problems (unfetchable feed, malformed feed XML, malformed
//! include selector) fail the whole run.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::extract::{extract, validate_include, ExtractionConfig, SelectorError};
use crate::feed::{parse_feed, FeedEntry, ParseError};
use crate::fetch::{FetchError, Fetcher};
use crate::rewrite::rewrite_links;

/// A run-level enrichment failure. Per-entry failures never surface here;
/// they become items with empty content.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The feed document itself could not be fetched.
    #[error("Feed fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// The feed document is not valid RSS/Atom — no entries can be derived.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The include selector is malformed; it is shared across all entries.
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// One synthesized full-text item: the entry's link plus the extracted,
/// exclusion-filtered, link-rewritten fragment of the linked page. Content
/// is the empty string when the entry's fetch or extraction failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedItem {
    pub link: String,
    pub content: String,
}

#[derive(Debug, Error)]
enum EntryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Run the pipeline over an already-fetched feed document.
///
/// Items come back in feed entry order regardless of fetch completion order
/// (`buffered` joins the fan-out in index order). `concurrency` bounds the
/// number of in-flight article fetches.
pub async fn enrich_entries(
    fetcher: &Fetcher,
    feed_bytes: &[u8],
    config: &ExtractionConfig,
    concurrency: usize,
) -> Result<Vec<EnrichedItem>, EnrichError> {
    let entries = parse_feed(feed_bytes)?;
    validate_include(config)?;

    let items: Vec<EnrichedItem> = stream::iter(entries.into_iter())
        .map(|entry| async move {
            let outcome = enrich_one(fetcher, &entry, config).await;
            let link = entry.link;
            match outcome {
                Ok(content) => EnrichedItem { link, content },
                Err(e) => {
                    tracing::warn!(link = %link, error = %e, "Entry enrichment failed, emitting empty content");
                    EnrichedItem {
                        link,
                        content: String::new(),
                    }
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    tracing::debug!(items = items.len(), "Enrichment run complete");
    Ok(items)
}

/// Fetch one entry's page and reduce it to its configured fragment. Links
/// are rewritten against the entry's own origin, not the feed's.
async fn enrich_one(
    fetcher: &Fetcher,
    entry: &FeedEntry,
    config: &ExtractionConfig,
) -> Result<String, EntryError> {
    let body = fetcher.fetch_article(&entry.link).await?;
    let html = String::from_utf8_lossy(&body);
    let content = extract(&html, config)?;

    match Url::parse(&entry.link) {
        Ok(origin) => Ok(rewrite_links(&content, &origin)),
        // Unresolvable origin: leave relative links as extracted
        Err(_) => Ok(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rss_with_links(links: &[String]) -> String {
        let items: String = links
            .iter()
            .map(|l| format!("<item><title>t</title><link>{l}</link></item>"))
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title>{items}</channel></rss>"#
        )
    }

    fn test_fetcher() -> Fetcher {
        Fetcher::new(Duration::from_secs(5), 1024 * 1024).unwrap()
    }

    #[tokio::test]
    async fn test_order_preserved_under_uneven_delays() {
        let mock_server = MockServer::start().await;
        // Later entries respond faster than earlier ones
        let delays_ms = [120u64, 80, 10];
        for (i, delay) in delays_ms.iter().enumerate() {
            Mock::given(method("GET"))
                .and(path(format!("/article/{i}")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_delay(Duration::from_millis(*delay))
                        .set_body_string(format!("<body><p>article {i}</p></body>")),
                )
                .mount(&mock_server)
                .await;
        }

        let links: Vec<String> = (0..3)
            .map(|i| format!("{}/article/{i}", mock_server.uri()))
            .collect();
        let feed = rss_with_links(&links);

        let items = enrich_entries(
            &test_fetcher(),
            feed.as_bytes(),
            &ExtractionConfig::default(),
            3,
        )
        .await
        .unwrap();

        assert_eq!(items.len(), 3);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.link, links[i]);
            assert_eq!(item.content, format!("<p>article {i}</p>"));
        }
    }

    #[tokio::test]
    async fn test_entry_failure_yields_empty_content() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<body><p>fine</p></body>"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let links = vec![
            format!("{}/ok", mock_server.uri()),
            format!("{}/gone", mock_server.uri()),
        ];
        let feed = rss_with_links(&links);

        let items = enrich_entries(
            &test_fetcher(),
            feed.as_bytes(),
            &ExtractionConfig::default(),
            2,
        )
        .await
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content, "<p>fine</p>");
        assert_eq!(items[1].content, "");
    }

    #[tokio::test]
    async fn test_stalled_entry_yields_empty_content_without_blocking_batch() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // One article answers 200 and then stalls mid-body forever
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stall_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(socket);
        });

        let mock_server = MockServer::start().await;
        for i in [0, 2] {
            Mock::given(method("GET"))
                .and(path(format!("/article/{i}")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(format!("<body><p>article {i}</p></body>")),
                )
                .mount(&mock_server)
                .await;
        }

        let links = vec![
            format!("{}/article/0", mock_server.uri()),
            format!("http://{stall_addr}/article/1"),
            format!("{}/article/2", mock_server.uri()),
        ];
        let feed = rss_with_links(&links);

        let fetcher = Fetcher::new(Duration::from_millis(200), 1024 * 1024).unwrap();
        let items = enrich_entries(&fetcher, feed.as_bytes(), &ExtractionConfig::default(), 3)
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].content, "<p>article 0</p>");
        assert_eq!(items[1].content, "");
        assert_eq!(items[2].content, "<p>article 2</p>");
    }

    #[tokio::test]
    async fn test_malformed_feed_fails_run() {
        let result = enrich_entries(
            &test_fetcher(),
            b"<not valid xml",
            &ExtractionConfig::default(),
            2,
        )
        .await;
        assert!(matches!(result.unwrap_err(), EnrichError::Parse(_)));
    }

    #[tokio::test]
    async fn test_malformed_include_selector_fails_run() {
        let feed = rss_with_links(&["https://example.com/a".to_string()]);
        let config = ExtractionConfig {
            include: Some("p[[".to_string()),
            exclude: vec![],
        };
        let result = enrich_entries(&test_fetcher(), feed.as_bytes(), &config, 2).await;
        assert!(matches!(result.unwrap_err(), EnrichError::Selector(_)));
    }

    #[tokio::test]
    async fn test_malformed_exclude_selector_fails_only_entries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<body><p>x</p></body>"))
            .mount(&mock_server)
            .await;

        let links = vec![format!("{}/a", mock_server.uri())];
        let feed = rss_with_links(&links);
        let config = ExtractionConfig {
            include: None,
            exclude: vec!["div:::bad".to_string()],
        };

        let items = enrich_entries(&test_fetcher(), feed.as_bytes(), &config, 2)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "");
    }

    #[tokio::test]
    async fn test_links_rewritten_against_entry_origin() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<body><p><a href="/rel">rel</a></p></body>"#),
            )
            .mount(&mock_server)
            .await;

        let links = vec![format!("{}/article", mock_server.uri())];
        let feed = rss_with_links(&links);

        let items = enrich_entries(
            &test_fetcher(),
            feed.as_bytes(),
            &ExtractionConfig::default(),
            1,
        )
        .await
        .unwrap();

        let expected = format!(r#"<p><a href="{}/rel">rel</a></p>"#, mock_server.uri());
        assert_eq!(items[0].content, expected);
    }

    #[tokio::test]
    async fn test_empty_feed_is_empty_result_not_error() {
        let feed = rss_with_links(&[]);
        let items = enrich_entries(
            &test_fetcher(),
            feed.as_bytes(),
            &ExtractionConfig::default(),
            2,
        )
        .await
        .unwrap();
        assert!(items.is_empty());
    }
}
