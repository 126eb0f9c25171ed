use anyhow::Result;

use super::schema::Database;
use super::types::{FeedSource, User};

/// Row shape shared by every feed query.
type FeedRow = (i64, i64, String, Option<String>, String);

fn row_to_feed(row: FeedRow) -> FeedSource {
    let (id, user_id, url, selector, exclusions) = row;
    // Rows written before the JSON column format settle to no exclusions
    let exclusions: Vec<String> = serde_json::from_str(&exclusions).unwrap_or_else(|e| {
        tracing::warn!(feed_id = id, error = %e, "Unreadable exclusion list, treating as empty");
        Vec::new()
    });
    FeedSource {
        id,
        user_id,
        url,
        selector,
        exclusions,
    }
}

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Look up a user by name, creating the record on first reference.
    pub async fn get_or_create_user(&self, name: &str) -> Result<User> {
        sqlx::query("INSERT INTO users (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let (id, name): (i64, String) = sqlx::query_as("SELECT id, name FROM users WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(User { id, name })
    }

    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Look up a user's feed by URL, creating it with default extraction
    /// configuration (include `body`, no exclusions) on first reference.
    pub async fn get_or_create_feed(&self, user_id: i64, url: &str) -> Result<FeedSource> {
        sqlx::query(
            "INSERT INTO feeds (user_id, url) VALUES (?, ?) ON CONFLICT(user_id, url) DO NOTHING",
        )
        .bind(user_id)
        .bind(url)
        .execute(&self.pool)
        .await?;

        let row: FeedRow = sqlx::query_as(
            "SELECT id, user_id, url, selector, exclusions FROM feeds WHERE user_id = ? AND url = ?",
        )
        .bind(user_id)
        .bind(url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_feed(row))
    }

    /// Fetch a user's feed by URL, if it exists.
    pub async fn get_feed(&self, user_id: i64, url: &str) -> Result<Option<FeedSource>> {
        let row: Option<FeedRow> = sqlx::query_as(
            "SELECT id, user_id, url, selector, exclusions FROM feeds WHERE user_id = ? AND url = ?",
        )
        .bind(user_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_feed))
    }

    /// All feeds belonging to a user, in creation order.
    pub async fn feeds_for_user(&self, user_id: i64) -> Result<Vec<FeedSource>> {
        let rows: Vec<FeedRow> = sqlx::query_as(
            "SELECT id, user_id, url, selector, exclusions FROM feeds WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_feed).collect())
    }

    /// Replace a feed's extraction configuration.
    ///
    /// The caller must also invalidate the result cache for this feed's URL
    /// ([`ResultCache::invalidate`](crate::cache::ResultCache::invalidate)) —
    /// cache records are keyed by URL only and would otherwise serve content
    /// extracted with the old selectors until the TTL runs out.
    pub async fn update_feed_selectors(
        &self,
        feed_id: i64,
        selector: Option<&str>,
        exclusions: &[String],
    ) -> Result<()> {
        let exclusions_json = serde_json::to_string(exclusions)?;
        sqlx::query("UPDATE feeds SET selector = ?, exclusions = ? WHERE id = ?")
            .bind(selector)
            .bind(&exclusions_json)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove a feed and its configuration.
    pub async fn delete_feed(&self, feed_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM feeds WHERE id = ?")
            .bind(feed_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
