use feed_rs::parser;
use thiserror::Error;

/// Malformed feed document (not parseable as RSS or Atom).
#[derive(Debug, Error)]
#[error("Feed parse error: {0}")]
pub struct ParseError(#[from] parser::ParseFeedError);

/// One entry of a parsed feed. Only the link matters to the pipeline;
/// everything else about the entry is replaced by the extracted page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub link: String,
}

/// Parse an RSS or Atom document into its ordered entry links.
///
/// Entries without a link are skipped — there is nothing to enrich for them.
/// Parsing is pure and synchronous; fetching happens elsewhere.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedEntry>, ParseError> {
    let feed = parser::parse(bytes)?;

    let total = feed.entries.len();
    let entries: Vec<FeedEntry> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            entry
                .links
                .first()
                .map(|l| FeedEntry { link: l.href.clone() })
        })
        .collect();

    let skipped = total - entries.len();
    if skipped > 0 {
        tracing::warn!(skipped = skipped, "Feed entries without links skipped");
    }

    Ok(entries)
}
