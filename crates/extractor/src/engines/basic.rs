// ABOUTME: Basic fallback engine: strip chrome elements, then take main/article/content div/body.
// ABOUTME: Uses dom_query since it can mutate the parsed document in place.

use dom_query::{Document, Matcher};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::{Engine, EngineError, EngineOutput};
use crate::formats::collect_links;

static CHROME_MATCHER: Lazy<Matcher> = Lazy::new(|| {
    Matcher::new("script, style, nav, footer, header, aside, noscript, iframe").unwrap()
});
static TITLE_MATCHER: Lazy<Matcher> = Lazy::new(|| Matcher::new("title").unwrap());
static AUTHOR_MATCHER: Lazy<Matcher> = Lazy::new(|| Matcher::new("meta[name='author']").unwrap());
static CLASSED_DIV_MATCHER: Lazy<Matcher> = Lazy::new(|| Matcher::new("div[class]").unwrap());
static CONTENT_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)content|main|article|post").unwrap());

/// Tag-stripping extractor, the last resort of the auto strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicEngine;

impl BasicEngine {
    fn main_content(doc: &Document) -> Option<String> {
        for tag in ["main", "article"] {
            let found = doc.select(tag);
            if found.exists() {
                return Some(found.first().html().to_string());
            }
        }

        let classed = doc.select_matcher(&CLASSED_DIV_MATCHER);
        let content_div = classed.iter().find(|div| {
            div.attr("class")
                .map(|class| CONTENT_CLASS_RE.is_match(&class))
                .unwrap_or(false)
        });
        if let Some(div) = content_div {
            return Some(div.html().to_string());
        }

        let body = doc.select("body");
        body.exists().then(|| body.first().inner_html().to_string())
    }
}

impl Engine for BasicEngine {
    fn run(&self, html: &str, base: &Url) -> Result<EngineOutput, EngineError> {
        let doc = Document::from(html);

        let title = Some(doc.select_matcher(&TITLE_MATCHER).first().text().trim().to_string())
            .filter(|t| !t.is_empty());
        let author = doc
            .select_matcher(&AUTHOR_MATCHER)
            .first()
            .attr("content")
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        doc.select_matcher(&CHROME_MATCHER).remove();

        let body_html = Self::main_content(&doc)
            .filter(|b| !b.trim().is_empty())
            .ok_or(EngineError::NoContent)?;
        let links = collect_links(&body_html, base);

        Ok(EngineOutput {
            title,
            author,
            date: None,
            body_html,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/post").unwrap()
    }

    #[test]
    fn prefers_main_and_drops_chrome() {
        let html = r#"<html><head><title> T </title><meta name="author" content="Ann"></head><body>
            <nav><a href="/home">Home</a></nav>
            <main><p>Main body text.</p><script>x()</script><aside>Aside</aside></main>
            <footer>Footer</footer>
        </body></html>"#;
        let out = BasicEngine.run(html, &base()).unwrap();
        assert_eq!(out.title.as_deref(), Some("T"));
        assert_eq!(out.author.as_deref(), Some("Ann"));
        assert!(out.body_html.contains("Main body text."));
        assert!(!out.body_html.contains("x()"));
        assert!(!out.body_html.contains("Aside"));
        assert!(!out.body_html.contains("Home"));
        assert!(out.links.is_empty());
    }

    #[test]
    fn falls_back_to_content_div_then_body() {
        let html = r#"<html><body><div class="sidebar">S</div><div class="post-body"><p>Post <a href="/a">link</a></p></div></body></html>"#;
        let out = BasicEngine.run(html, &base()).unwrap();
        assert!(out.body_html.starts_with("<div class=\"post-body\">"));
        assert_eq!(out.links.len(), 1);
        assert_eq!(out.links[0].href, "https://example.com/a");

        let out = BasicEngine.run("<html><body><p>Just body</p></body></html>", &base()).unwrap();
        assert!(out.body_html.contains("Just body"));
    }

    #[test]
    fn empty_document_has_no_content() {
        let err = BasicEngine.run("<html><body>  </body></html>", &base()).unwrap_err();
        assert!(matches!(err, EngineError::NoContent));
    }
}
