// ABOUTME: Best-effort document metadata: title, author and published date from meta tags, markup and JSON-LD.
// ABOUTME: Lookups never fail; a field that cannot be found is simply None.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::dom::normalize_spaces;
use crate::result::DocumentMeta;

const TITLE_SELECTORS: &[&str] = &[
    "title",
    "meta[property='og:title']",
    "meta[name='title']",
    "h1",
    "h2",
];

const AUTHOR_SELECTORS: &[&str] = &[
    "meta[name='author']",
    "meta[property='article:author']",
    "meta[name='byl']",
    "[rel='author']",
    ".byline",
    ".author",
    "[itemprop='author']",
];

const DATE_META_SELECTORS: &[&str] = &[
    "meta[property='article:published_time']",
    "meta[name='article:published_time']",
    "meta[itemprop='datePublished']",
    "meta[name='date']",
    "meta[name='pubdate']",
    "meta[name='dc.date']",
];

const ARTICLE_TYPES: &[&str] = &["NewsArticle", "BlogPosting", "Article"];

/// Content attribute of the first matching meta tag with a non-empty value.
pub fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    attr_first(doc, selector, "content")
}

/// First non-empty value of `attr` among elements matching `selector`.
pub fn attr_first(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// First non-empty text from a list of selectors, reading `content` for meta tags.
pub fn text_field(doc: &Html, selectors: &[&str]) -> Option<String> {
    for &selector in selectors {
        if selector.starts_with("meta[") {
            if let Some(value) = meta_content(doc, selector) {
                return Some(normalize_spaces(&value));
            }
            continue;
        }

        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        let found = doc
            .select(&sel)
            .map(|el| normalize_spaces(&el.text().collect::<Vec<_>>().join(" ")))
            .find(|text| !text.is_empty());
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Parse a date string into a calendar date.
///
/// RFC 3339 keeps its own offset so the day never shifts. Plain ISO dates
/// and a handful of loose English forms are tried before dateparser.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    const LOOSE_PATTERNS: &[&str] = &[
        "%Y-%m-%d",  // 2024-01-05
        "%Y/%m/%d",  // 2024/01/05
        "%b %e, %Y", // Jan 5, 2024
        "%e %b %Y",  // 5 Jan 2024
        "%b %d, %Y", // Jan 05, 2024
        "%d %b %Y",  // 05 Jan 2024
        "%B %e, %Y", // January 5, 2024
        "%e %B %Y",  // 5 January 2024
        "%B %d, %Y", // January 05, 2024
        "%d %B %Y",  // 05 January 2024
    ];
    for pattern in LOOSE_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(s, pattern) {
            return Some(date);
        }
    }

    // dateparser fills a bare time with today's date
    if !has_date_part(s) {
        return None;
    }
    dateparser::parse(s).ok().map(|dt| dt.date_naive())
}

static DATE_PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d{4}|\d{1,2}[/.-]\d{1,2}[/.-]\d{2}|\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\b",
    )
    .unwrap()
});

fn has_date_part(s: &str) -> bool {
    DATE_PART_RE.is_match(s)
}

/// Render a date as `YYYY-MM-DD` when it parses, otherwise the trimmed input.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        parse_date(trimmed)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| trimmed.to_string()),
    )
}

pub fn extract_title(doc: &Html) -> Option<String> {
    text_field(doc, TITLE_SELECTORS)
}

pub fn extract_author(doc: &Html) -> Option<String> {
    text_field(doc, AUTHOR_SELECTORS).or_else(|| ld_json_string(doc, author_of))
}

/// Published date from meta tags, `<time>` markup or JSON-LD, normalized.
pub fn extract_date(doc: &Html) -> Option<String> {
    let raw = DATE_META_SELECTORS
        .iter()
        .find_map(|sel| meta_content(doc, sel))
        .or_else(|| ld_json_string(doc, |obj| string_field(obj, "datePublished")))
        .or_else(|| attr_first(doc, "time[datetime]", "datetime"))
        .or_else(|| text_field(doc, &["time"]).filter(|text| parse_date(text).is_some()))?;
    normalize_date(&raw)
}

/// Metadata of a whole document.
pub fn document_meta(doc: &Html) -> DocumentMeta {
    DocumentMeta {
        title: extract_title(doc),
        author: extract_author(doc),
        published_date: extract_date(doc),
    }
}

fn ld_json_values(doc: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse("script[type='application/ld+json']") else {
        return Vec::new();
    };
    doc.select(&selector)
        .filter_map(|script| {
            let text = script.text().collect::<String>();
            serde_json::from_str::<Value>(text.trim()).ok()
        })
        .collect()
}

/// Apply `pick` to the first article object found in any JSON-LD block.
fn ld_json_string<F>(doc: &Html, pick: F) -> Option<String>
where
    F: Fn(&serde_json::Map<String, Value>) -> Option<String>,
{
    ld_json_values(doc)
        .iter()
        .find_map(|value| find_article(value, &pick))
}

fn find_article<F>(value: &Value, pick: &F) -> Option<String>
where
    F: Fn(&serde_json::Map<String, Value>) -> Option<String>,
{
    match value {
        Value::Object(map) => {
            let is_article = map
                .get("@type")
                .map(|t| ARTICLE_TYPES.iter().any(|expected| matches_type(t, expected)))
                .unwrap_or(false);
            if is_article {
                if let Some(found) = pick(map) {
                    return Some(found);
                }
            }
            for key in ["@graph", "mainEntity", "mainEntityOfPage", "itemListElement"] {
                if let Some(found) = map.get(key).and_then(|v| find_article(v, pick)) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(|v| find_article(v, pick)),
        _ => None,
    }
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s.eq_ignore_ascii_case(expected),
        Value::Array(items) => items.iter().any(|v| matches_type(v, expected)),
        _ => false,
    }
}

fn string_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn author_of(map: &serde_json::Map<String, Value>) -> Option<String> {
    let names: Vec<String> = match map.get("author")? {
        Value::String(s) => vec![s.trim().to_string()],
        Value::Object(person) => string_field(person, "name").into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(person) => string_field(person, "name"),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    let joined = names
        .into_iter()
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    (!joined.is_empty()).then_some(joined)
}

/// `articleBody` of the first article object in the document's JSON-LD.
///
/// Array bodies are joined with blank lines.
pub fn ld_json_article_body(doc: &Html) -> Option<String> {
    ld_json_string(doc, |map| match map.get("articleBody")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.to_string()),
        Value::Array(parts) => {
            let joined = parts
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n\n");
            (!joined.trim().is_empty()).then_some(joined)
        }
        _ => None,
    })
}

/// `headline` of the first article object in the document's JSON-LD.
pub fn ld_json_headline(doc: &Html) -> Option<String> {
    ld_json_string(doc, |map| string_field(map, "headline"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn title_prefers_title_tag_then_og() {
        let doc = Html::parse_document(
            r#"<html><head><title> Page  Title </title><meta property="og:title" content="OG"></head></html>"#,
        );
        assert_eq!(extract_title(&doc).as_deref(), Some("Page Title"));

        let doc = Html::parse_document(
            r#"<html><head><meta property="og:title" content="OG Title"></head><body><h1>H</h1></body></html>"#,
        );
        assert_eq!(extract_title(&doc).as_deref(), Some("OG Title"));

        let doc = Html::parse_document("<html><body><h1>Heading</h1></body></html>");
        assert_eq!(extract_title(&doc).as_deref(), Some("Heading"));
    }

    #[test]
    fn author_from_meta_byline_or_ld_json() {
        let doc = Html::parse_document(r#"<meta name="author" content="Jane Doe">"#);
        assert_eq!(extract_author(&doc).as_deref(), Some("Jane Doe"));

        let doc = Html::parse_document(r#"<div class="byline">By  Sam</div>"#);
        assert_eq!(extract_author(&doc).as_deref(), Some("By Sam"));

        let doc = Html::parse_document(
            r#"<script type="application/ld+json">{"@type":"NewsArticle","author":[{"@type":"Person","name":"A"},{"name":"B"}]}</script>"#,
        );
        assert_eq!(extract_author(&doc).as_deref(), Some("A, B"));
    }

    #[test]
    fn date_sources_are_normalized() {
        let doc = Html::parse_document(
            r#"<meta property="article:published_time" content="2024-03-05T23:30:00-05:00">"#,
        );
        assert_eq!(extract_date(&doc).as_deref(), Some("2024-03-05"));

        let doc = Html::parse_document(r#"<time datetime="2023-11-02">Nov 2</time>"#);
        assert_eq!(extract_date(&doc).as_deref(), Some("2023-11-02"));

        let doc = Html::parse_document("<time>January 5, 2024</time>");
        assert_eq!(extract_date(&doc).as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn unparseable_dates_are_kept_raw() {
        assert_eq!(normalize_date("  sometime last spring "), Some("sometime last spring".to_string()));
        assert_eq!(normalize_date("   "), None);
    }

    #[test]
    fn times_without_a_date_are_not_dates() {
        for raw in ["4:00pm", "10:30 am", "12:45"] {
            assert_eq!(parse_date(raw), None, "{raw}");
            assert_eq!(normalize_date(raw).as_deref(), Some(raw));
        }

        let doc = Html::parse_document("<html><body><time>4:00pm</time></body></html>");
        assert_eq!(extract_date(&doc), None);

        assert_eq!(
            parse_date("Tue, 5 Mar 2024 10:00:00 +0000"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn missing_metadata_is_none() {
        let doc = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        let meta = document_meta(&doc);
        assert_eq!(meta.title, None);
        assert_eq!(meta.author, None);
        assert_eq!(meta.published_date, None);
    }

    #[test]
    fn ld_json_body_found_in_graph() {
        let doc = Html::parse_document(
            r#"<script type="application/ld+json">{"@graph":[{"@type":"WebPage"},{"@type":["Article"],"headline":"H","articleBody":"Body text"}]}</script>"#,
        );
        assert_eq!(ld_json_article_body(&doc).as_deref(), Some("Body text"));
        assert_eq!(ld_json_headline(&doc).as_deref(), Some("H"));
    }
}
