//! Rewrites root-relative anchor links inside an extracted fragment to
//! absolute URLs, so content lifted out of a page keeps working wherever the
//! enriched feed is read.
//!
//! The rewrite is string-level over the already-serialized fragment: only
//! the matched `href` value changes, never surrounding markup or attribute
//! order.

use regex::{Captures, Regex};
use std::sync::OnceLock;
use url::Url;

static ANCHOR_HREF_RE: OnceLock<Regex> = OnceLock::new();

/// Matches `href="/..."` inside an opening anchor tag. The path group
/// deliberately includes protocol-relative `//host` values so the closure
/// can leave them untouched.
fn anchor_href_re() -> &'static Regex {
    ANCHOR_HREF_RE.get_or_init(|| Regex::new(r#"(<a\b[^>]*?href=")(/[^"]*)(")"#).unwrap())
}

/// Rewrite root-relative anchor hrefs in `fragment` against `origin`.
///
/// Only hrefs beginning with a single `/` are touched; absolute,
/// protocol-relative (`//host`), fragment (`#x`) and `mailto:` hrefs pass
/// through unchanged. An origin without a host (e.g. an opaque URL) leaves
/// the fragment as-is.
pub fn rewrite_links(fragment: &str, origin: &Url) -> String {
    if origin.host_str().is_none() {
        return fragment.to_string();
    }
    // "scheme://host[:port]", no trailing slash
    let base = origin.origin().ascii_serialization();

    anchor_href_re()
        .replace_all(fragment, |caps: &Captures<'_>| {
            let path = &caps[2];
            if path.starts_with("//") {
                // Protocol-relative; not ours to resolve
                caps[0].to_string()
            } else {
                format!("{}{}{}{}", &caps[1], base, path, &caps[3])
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn origin(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_root_relative_href_rewritten() {
        let out = rewrite_links(
            r#"<a href="/foo">foo</a>"#,
            &origin("https://example.com/feed"),
        );
        assert_eq!(out, r#"<a href="https://example.com/foo">foo</a>"#);
    }

    #[test]
    fn test_absolute_href_untouched() {
        let input = r#"<a href="https://other.com/x">x</a>"#;
        let out = rewrite_links(input, &origin("https://example.com/feed"));
        assert_eq!(out, input);
    }

    #[test]
    fn test_fragment_and_mailto_untouched() {
        let input = r##"<a href="#anchor">a</a><a href="mailto:x@example.com">m</a>"##;
        let out = rewrite_links(input, &origin("https://example.com/"));
        assert_eq!(out, input);
    }

    #[test]
    fn test_protocol_relative_untouched() {
        let input = r#"<a href="//cdn.example.com/x">x</a>"#;
        let out = rewrite_links(input, &origin("https://example.com/"));
        assert_eq!(out, input);
    }

    #[test]
    fn test_other_attributes_preserved_in_place() {
        let out = rewrite_links(
            r#"<p>see <a class="ref" href="/doc" title="d">doc</a> here</p>"#,
            &origin("https://example.com/articles/1"),
        );
        assert_eq!(
            out,
            r#"<p>see <a class="ref" href="https://example.com/doc" title="d">doc</a> here</p>"#
        );
    }

    #[test]
    fn test_origin_port_preserved() {
        let out = rewrite_links(
            r#"<a href="/p">p</a>"#,
            &origin("http://localhost:8080/feed.xml"),
        );
        assert_eq!(out, r#"<a href="http://localhost:8080/p">p</a>"#);
    }

    #[test]
    fn test_non_anchor_href_like_text_untouched() {
        // Only anchor tags are rewritten
        let input = r#"<link href="/style.css"><a href="/x">x</a>"#;
        let out = rewrite_links(input, &origin("https://example.com/"));
        assert_eq!(
            out,
            r#"<link href="/style.css"><a href="https://example.com/x">x</a>"#
        );
    }

    #[test]
    fn test_multiple_anchors() {
        let out = rewrite_links(
            r#"<a href="/1">1</a> and <a href="/2">2</a>"#,
            &origin("https://example.com/feed"),
        );
        assert_eq!(
            out,
            r#"<a href="https://example.com/1">1</a> and <a href="https://example.com/2">2</a>"#
        );
    }
}
