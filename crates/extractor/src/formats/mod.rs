// ABOUTME: Output normalization for extracted bodies: sanitizing, markdown and plain-text conversion.
// ABOUTME: Every engine's output passes through here so results look the same regardless of origin.

//! Output format conversion module.
//!
//! Engines hand back an HTML fragment. This module turns that fragment into
//! the single markdown dialect the crate emits (ATX headings, `-` bullets,
//! inline links, at most one blank line between blocks) and provides the
//! plain-text view used by the quality check.

use std::collections::HashSet;

use htmd::options::{BulletListMarker, HeadingStyle, Options as MarkdownOptions};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use url::Url;

use crate::result::Link;

static BR_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
static BLANK_RUNS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NEWLINE_RUNS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static HORIZONTAL_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static TRAILING_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());
static MD_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)]*)\)").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Sanitize an extracted fragment with an article-oriented ammonia policy.
///
/// Keeps text structure (paragraphs, headings, lists, quotes, code, tables),
/// links and images. Scripts, styles, forms and event handlers are dropped.
pub fn sanitize_html(html: &str) -> String {
    let allowed_tags = [
        "p", "br", "strong", "b", "em", "i", "u", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol",
        "li", "blockquote", "pre", "code", "img", "a", "span", "div", "table", "thead", "tbody",
        "tr", "th", "td", "figure", "figcaption",
    ];

    let mut builder = ammonia::Builder::new();
    builder.tags(allowed_tags.iter().copied().collect());
    builder.add_tag_attributes("a", &["href"]);
    builder.add_tag_attributes("img", &["src", "alt"]);
    builder.link_rel(None);

    builder
        .url_schemes(["http", "https", "mailto"].iter().copied().collect())
        .clean(html)
        .to_string()
}

fn preprocess_br_tags(html: &str) -> String {
    BR_TAG_RE.replace_all(html, "\n").to_string()
}

/// Collapse runs of blank lines so at most one blank line separates blocks.
fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUNS_RE.replace_all(text, "\n\n").to_string()
}

/// Convert an HTML fragment to markdown using htmd.
///
/// Script, style and noscript content is skipped. On conversion error the
/// original string is returned unchanged.
pub fn html_to_markdown(html: &str) -> String {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript"])
        .options(MarkdownOptions {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            ..Default::default()
        })
        .build();

    let md = converter
        .convert(html)
        .unwrap_or_else(|_| html.to_string());

    collapse_blank_lines(&md)
}

/// Produce the canonical markdown body for an extracted fragment.
///
/// The fragment is sanitized, converted, stripped of trailing whitespace and
/// blank-line runs, and trimmed. With `include_links` false, inline links are
/// reduced to their text while images are kept.
pub fn normalize_body(html: &str, include_links: bool) -> String {
    let sanitized = sanitize_html(html);
    let md = html_to_markdown(&sanitized);
    let md = if include_links {
        md
    } else {
        strip_markdown_links(&md)
    };
    let md = TRAILING_WS_RE.replace_all(&md, "");
    collapse_blank_lines(&md).trim().to_string()
}

/// Replace `[text](href)` with `text`, leaving `![alt](src)` images alone.
pub fn strip_markdown_links(markdown: &str) -> String {
    MD_LINK_RE
        .replace_all(markdown, |caps: &Captures| {
            if &caps[1] == "!" {
                caps[0].to_string()
            } else {
                caps[2].to_string()
            }
        })
        .to_string()
}

/// Convert HTML to plain text by extracting text nodes.
///
/// Treats <br> as newline, collapses horizontal whitespace and newline runs,
/// and trims the result.
pub fn html_to_text(html: &str) -> String {
    let preprocessed = preprocess_br_tags(html);

    let document = Html::parse_fragment(&preprocessed);
    let raw_text: String = document.root_element().text().collect::<Vec<_>>().join(" ");

    let normalized = HORIZONTAL_WS_RE.replace_all(&raw_text, " ");
    let collapsed = NEWLINE_RUNS_RE.replace_all(&normalized, "\n");

    collapsed.trim().to_string()
}

/// Number of characters in the fragment's text once all whitespace runs are
/// collapsed to single spaces.
pub fn normalized_text_len(html: &str) -> usize {
    html_to_text(html)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .count()
}

/// Collect the links of a fragment in document order.
///
/// Hrefs are resolved against `base`; fragment-only, javascript and
/// unresolvable hrefs are skipped, and each href is kept once.
pub fn collect_links(html: &str, base: &Url) -> Vec<Link> {
    let fragment = Html::parse_fragment(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in fragment.select(&ANCHOR_SELECTOR) {
        let Some(raw) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if raw.is_empty() || raw.starts_with('#') || raw.to_lowercase().starts_with("javascript:")
        {
            continue;
        }
        let Ok(resolved) = base.join(raw) else {
            continue;
        };
        let href = resolved.to_string();
        if !seen.insert(href.clone()) {
            continue;
        }
        let text = anchor
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        links.push(Link { text, href });
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn html_to_markdown_converts_headings_atx() {
        let md = html_to_markdown("<h1>Hello</h1><h2>World</h2>");
        assert!(md.starts_with("# Hello"), "got: {}", md);
        assert!(md.contains("## World"), "got: {}", md);
    }

    #[test]
    fn html_to_markdown_uses_dash_bullets() {
        let md = html_to_markdown("<ul><li>One</li><li>Two</li></ul>");
        assert!(md.contains("- One"), "got: {}", md);
        assert!(md.contains("- Two"), "got: {}", md);
    }

    #[test]
    fn html_to_markdown_skips_script_and_style() {
        let html = "<p>Before</p><script>alert(1)</script><style>.x{}</style><p>After</p>";
        let md = html_to_markdown(html);
        assert!(!md.contains("alert"), "got: {}", md);
        assert!(!md.contains(".x{}"), "got: {}", md);
        assert!(md.contains("Before") && md.contains("After"), "got: {}", md);
    }

    #[test]
    fn html_to_markdown_preserves_links() {
        let html = r#"<p>Visit <a href="https://example.com">Example</a></p>"#;
        let md = html_to_markdown(html);
        assert!(md.contains("[Example](https://example.com)"), "got: {}", md);
    }

    #[test]
    fn normalize_body_strips_links_but_keeps_images() {
        let html = r#"<p>Read <a href="https://example.com/a">the docs</a> now.</p><p><img src="https://example.com/i.png" alt="Pic"></p>"#;
        let md = normalize_body(html, false);
        assert!(md.contains("Read the docs now."), "got: {}", md);
        assert!(!md.contains("](https://example.com/a)"), "got: {}", md);
        assert!(md.contains("![Pic](https://example.com/i.png)"), "got: {}", md);
    }

    #[test]
    fn normalize_body_collapses_blank_lines_and_trims() {
        let md = normalize_body("<p>Para 1</p>\n\n\n\n<p>Para 2</p>\n\n", true);
        assert!(!md.contains("\n\n\n"), "got: {:?}", md);
        assert_eq!(md, md.trim());
    }

    #[test]
    fn normalize_body_drops_forms_and_handlers() {
        let html = r#"<p onclick="x()">Text</p><form><input name="q"></form>"#;
        let md = normalize_body(html, true);
        assert_eq!(md, "Text");
    }

    #[test]
    fn strip_markdown_links_handles_multiple() {
        let md = "[a](http://a) and [b](http://b \"title\") ![c](http://c.png)";
        assert_eq!(strip_markdown_links(md), "a and b ![c](http://c.png)");
    }

    #[test]
    fn html_to_text_strips_tags_and_collapses_whitespace() {
        assert_eq!(html_to_text("<p>Hello   world</p>"), "Hello world");
        assert_eq!(
            html_to_text("<div><span>One</span> <em>Two</em> <strong>Three</strong></div>"),
            "One Two Three"
        );
    }

    #[test]
    fn normalized_text_len_counts_chars() {
        assert_eq!(normalized_text_len("<p>  caf\u{e9}  \n\n au   lait </p>"), 12);
        assert_eq!(normalized_text_len("   "), 0);
    }

    #[test]
    fn collect_links_resolves_and_dedupes() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        let html = r##"
            <p><a href="/about">About  us</a></p>
            <p><a href="other">Other</a> <a href="#top">Top</a></p>
            <p><a href="javascript:void(0)">JS</a> <a href="https://example.com/about">Again</a></p>
        "##;
        let links = collect_links(html, &base);
        assert_eq!(
            links,
            vec![
                Link {
                    text: "About us".to_string(),
                    href: "https://example.com/about".to_string()
                },
                Link {
                    text: "Other".to_string(),
                    href: "https://example.com/blog/other".to_string()
                },
            ]
        );
    }
}
