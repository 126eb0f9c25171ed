//! Persistence for users and their per-feed extraction configuration.
//!
//! A small SQLite store: `users` by name, `feeds` by (user, url) with the
//! include selector and exclusion list a feed is enriched with. The
//! enrichment pipeline only ever reads this configuration; the embedding
//! layer owns all writes.

mod feeds;
mod schema;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, FeedSource, User};
