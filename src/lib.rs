//! fullfeed — synthesize full-text feeds from summary-only RSS/Atom sources.
//!
//! Many feeds carry only teasers. This crate fetches a feed, follows every
//! entry's link, extracts a configurable DOM subset from the linked page and
//! assembles the results into an enriched item list, memoized per feed URL
//! with a short TTL:
//!
//! - [`feed`] - RSS/Atom parsing into entry links (via `feed-rs`)
//! - [`fetch`] - HTTP retrieval with timeout and size limits
//! - [`extract`] - CSS-selector content extraction and exclusion pruning
//! - [`rewrite`] - root-relative link rewriting against the article origin
//! - [`pipeline`] - concurrent per-entry fan-out, order-preserving fan-in
//! - [`cache`] - TTL memoization keyed by feed URL
//! - [`storage`] - per-user per-feed selector configuration (SQLite)
//!
//! [`FullFeed`] is the embedding layer's entry point: it wires the fetcher,
//! pipeline and cache together behind [`FullFeed::enrich`] and
//! [`FullFeed::invalidate_cache`].

use std::time::Duration;

pub mod cache;
pub mod config;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod pipeline;
pub mod rewrite;
pub mod storage;

pub use cache::ResultCache;
pub use config::{Config, ConfigError};
pub use extract::{ExtractionConfig, SelectorError};
pub use feed::ParseError;
pub use fetch::{FetchError, Fetcher};
pub use pipeline::{EnrichError, EnrichedItem};

/// The enrichment service: fetcher + pipeline behind a TTL result cache.
///
/// One instance is shared across handler invocations; the cache is the only
/// mutable state and is internally synchronized.
pub struct FullFeed {
    config: Config,
    fetcher: Fetcher,
    cache: ResultCache,
}

impl FullFeed {
    /// Build the service from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP clients cannot be constructed.
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let fetcher = Fetcher::new(config.fetch_timeout(), config.max_body_bytes)?;
        Ok(Self {
            config,
            fetcher,
            cache: ResultCache::new(),
        })
    }

    /// The configured cache TTL, for callers that have no reason to override
    /// it per request.
    pub fn default_ttl(&self) -> Duration {
        self.config.cache_ttl()
    }

    /// Enrich a feed: return the cached result if one younger than `ttl`
    /// exists, otherwise fetch the feed, run the full pipeline and cache the
    /// outcome.
    ///
    /// Zero entries is a valid result (`Ok` with an empty vec), distinct
    /// from the run-level failures in [`EnrichError`]. Failed runs are never
    /// cached. Concurrent calls for the same URL during a recompute are not
    /// coalesced; both run and the last writer wins.
    pub async fn enrich(
        &self,
        feed_url: &str,
        config: &ExtractionConfig,
        ttl: Duration,
    ) -> Result<Vec<EnrichedItem>, EnrichError> {
        if let Some(items) = self.cache.get(feed_url, ttl) {
            tracing::debug!(feed = %feed_url, items = items.len(), "Serving cached enrichment");
            return Ok(items);
        }

        tracing::info!(feed = %feed_url, "Running enrichment pipeline");
        let feed_bytes = self.fetcher.fetch_feed(feed_url).await?;
        let items = pipeline::enrich_entries(
            &self.fetcher,
            &feed_bytes,
            config,
            self.config.max_concurrent_fetches,
        )
        .await?;

        self.cache.insert(feed_url, items.clone());
        Ok(items)
    }

    /// Drop the cached result for a feed URL.
    ///
    /// The configuration-update path calls this after changing a feed's
    /// selectors so the next `enrich` recomputes instead of serving content
    /// extracted with the old configuration.
    pub fn invalidate_cache(&self, feed_url: &str) {
        tracing::debug!(feed = %feed_url, "Invalidating cached enrichment");
        self.cache.invalidate(feed_url);
    }
}
