//! TTL-based memoization of enrichment runs, keyed by feed URL.
//!
//! One record per distinct feed URL, overwritten on recompute. There is no
//! eviction beyond that overwrite — growth is bounded by the number of
//! distinct feeds the process serves. Keys are feed URLs only; a selector
//! configuration change must go through [`ResultCache::invalidate`] or the
//! next read inside the TTL window returns content extracted with the old
//! selectors.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;

use crate::pipeline::EnrichedItem;

struct CacheRecord {
    items: Vec<EnrichedItem>,
    stored_at: Instant,
}

/// Process-wide cache of enrichment results.
///
/// Guarded by a single `RwLock`; stores are small (one entry per feed URL)
/// and not performance-critical. Uses `tokio::time::Instant` so tests can
/// drive expiry with a paused clock.
#[derive(Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<String, CacheRecord>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `feed_url` if it is younger than `ttl`.
    pub fn get(&self, feed_url: &str, ttl: Duration) -> Option<Vec<EnrichedItem>> {
        let entries = self.entries.read().ok()?;
        let record = entries.get(feed_url)?;
        if record.stored_at.elapsed() > ttl {
            return None;
        }
        Some(record.items.clone())
    }

    /// Store (or overwrite) the result for `feed_url` with the current time.
    pub fn insert(&self, feed_url: &str, items: Vec<EnrichedItem>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                feed_url.to_string(),
                CacheRecord {
                    items,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Drop any record for `feed_url` so the next read recomputes.
    ///
    /// The configuration-update path must call this after a selector change.
    pub fn invalidate(&self, feed_url: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(feed_url);
        }
    }

    /// Number of records currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
