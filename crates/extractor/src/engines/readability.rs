// ABOUTME: Readability engine: score every node, take the best candidate with its siblings, clean it.
// ABOUTME: Only the <title> is reported as metadata; the selector fills in the rest from the document.

use scraper::Html;
use url::Url;

use super::{Engine, EngineError, EngineOutput};
use crate::dom::cleaners::clean_article;
use crate::dom::scoring::best_content;
use crate::formats::collect_links;
use crate::metadata::text_field;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReadabilityEngine;

impl Engine for ReadabilityEngine {
    fn run(&self, html: &str, base: &Url) -> Result<EngineOutput, EngineError> {
        let doc = Html::parse_document(html);
        let title = text_field(&doc, &["title"]);

        let content = best_content(&doc).ok_or(EngineError::NoContent)?;
        let body_html = clean_article(&content, title.as_deref().unwrap_or(""));
        if body_html.trim().is_empty() {
            return Err(EngineError::NoContent);
        }

        let links = collect_links(&body_html, base);
        Ok(EngineOutput {
            title,
            author: None,
            date: None,
            body_html,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_scored_story() {
        let html = r#"<html><head><title>Readable</title></head><body>
            <div class="nav"><a href="/a">A</a> <a href="/b">B</a></div>
            <div id="story">
                <p>Readability favours paragraphs with commas, length, and a calm structure overall.</p>
                <p>The second paragraph continues, adding clauses, details, and a little more weight.</p>
                <p>Finally a third one closes the piece, with <a href="/more">a link</a> and a period.</p>
            </div>
        </body></html>"#;
        let base = Url::parse("https://example.com/").unwrap();
        let out = ReadabilityEngine.run(html, &base).unwrap();
        assert_eq!(out.title.as_deref(), Some("Readable"));
        assert!(out.body_html.contains("Readability favours paragraphs"));
        assert!(!out.body_html.contains(">A<"));
        assert_eq!(out.links.len(), 1);
        assert_eq!(out.links[0].href, "https://example.com/more");
    }
}
