//! Selector-based content extraction.
//!
//! Extraction works on a parsed DOM: exclusion selectors prune the tree in
//! place (cumulatively, in configuration order), then the inner markup of
//! every include-selector match is concatenated in document order. `script`
//! elements are always pruned, configured or not.

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Include selector applied when none is configured.
const DEFAULT_INCLUDE: &str = "body";

/// Tag stripped from every document regardless of configuration.
const BASELINE_EXCLUDE_TAG: &str = "script";

static TAG_NAME_RE: OnceLock<Regex> = OnceLock::new();

/// An exclusion entry is a bare tag name when it is letters only;
/// anything else is treated as a general CSS selector.
fn tag_name_re() -> &'static Regex {
    TAG_NAME_RE.get_or_init(|| Regex::new("^[a-zA-Z]+$").unwrap())
}

/// Malformed CSS selector.
///
/// For an exclusion selector this fails only the entry being extracted; for
/// the include selector the pipeline fails the whole run, since that
/// selector is shared across all entries.
#[derive(Debug, Error)]
#[error("Invalid selector `{selector}`: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// Per-feed extraction configuration: what to keep, what to strip.
///
/// Populated from the persisted [`FeedSource`](crate::storage::FeedSource)
/// by the embedding layer. No selector validation happens here; errors
/// surface from the engine as [`SelectorError`] when the selectors are used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// CSS selector for the content to keep. `None` means `body`.
    pub include: Option<String>,
    /// Ordered exclusion selectors; bare tag names remove by tag, anything
    /// else is a general CSS selector. `script` is implied.
    pub exclude: Vec<String>,
}

impl ExtractionConfig {
    /// The effective include selector (`body` when unset or blank).
    pub fn include_selector(&self) -> &str {
        self.include
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_INCLUDE)
    }
}

/// Extract the configured content fragment from an HTML document.
///
/// Returns the concatenated inner markup of every include match against the
/// pruned tree — children only, not the matched element's enclosing tag. An
/// include selector that matches nothing yields an empty string, not an
/// error.
pub fn extract(html: &str, config: &ExtractionConfig) -> Result<String, SelectorError> {
    let include = parse_selector(config.include_selector())?;
    let mut doc = Html::parse_document(html);

    remove_tag(&mut doc, BASELINE_EXCLUDE_TAG);
    for raw in &config.exclude {
        let sel = raw.trim();
        if sel.is_empty() {
            continue;
        }
        if tag_name_re().is_match(sel) {
            // html5ever lowercases element names while parsing
            remove_tag(&mut doc, &sel.to_ascii_lowercase());
        } else {
            let parsed = parse_selector(sel)?;
            remove_matching(&mut doc, &parsed);
        }
    }

    let mut fragment = String::new();
    for element in doc.select(&include) {
        fragment.push_str(&element.inner_html());
    }
    Ok(fragment)
}

/// Check the include selector parses, without touching a document.
///
/// The pipeline calls this once per run: the include selector is shared by
/// every entry, so a malformed one fails the run up front instead of
/// producing a batch of empty items.
pub fn validate_include(config: &ExtractionConfig) -> Result<(), SelectorError> {
    parse_selector(config.include_selector()).map(|_| ())
}

fn parse_selector(raw: &str) -> Result<Selector, SelectorError> {
    Selector::parse(raw).map_err(|e| SelectorError {
        selector: raw.to_string(),
        message: e.to_string(),
    })
}

/// Detach every element with the given tag name, subtree included.
fn remove_tag(doc: &mut Html, tag: &str) {
    let ids: Vec<_> = doc
        .tree
        .nodes()
        .filter(|node| {
            node.value()
                .as_element()
                .is_some_and(|el| el.name() == tag)
        })
        .map(|node| node.id())
        .collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Detach every selector match, subtree included.
fn remove_matching(doc: &mut Html, selector: &Selector) {
    let ids: Vec<_> = doc.select(selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}
