// ABOUTME: Article engine filling the trafilatura slot: explicit article containers, then JSON-LD articleBody.
// ABOUTME: Reads title, author and date from JSON-LD and meta tags alongside the body.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{Engine, EngineError, EngineOutput};
use crate::dom::cleaners::clean_article;
use crate::dom::element_text;
use crate::formats::{collect_links, html_to_text};
use crate::metadata;

/// Below this many characters of text the container result is treated as
/// thin and JSON-LD is consulted.
const THIN_BODY_CHARS: usize = 500;

static CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "[itemprop='articleBody'], article, .entry-content, .post-content, .article-body, main",
    )
    .unwrap()
});

#[derive(Debug, Default, Clone, Copy)]
pub struct ArticleEngine;

impl ArticleEngine {
    /// The explicit article container carrying the most text.
    fn best_container(doc: &Html) -> Option<ElementRef<'_>> {
        doc.select(&CONTAINER_SELECTOR)
            .map(|el| (element_text(&el).len(), el))
            .filter(|(len, _)| *len > 0)
            .max_by_key(|(len, _)| *len)
            .map(|(_, el)| el)
    }
}

fn paragraphs_to_html(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let escaped = p
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            format!("<p>{}</p>", escaped)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl Engine for ArticleEngine {
    fn run(&self, html: &str, base: &Url) -> Result<EngineOutput, EngineError> {
        let doc = Html::parse_document(html);
        let title = metadata::ld_json_headline(&doc).or_else(|| metadata::extract_title(&doc));

        let mut body_html = Self::best_container(&doc)
            .map(|container| clean_article(&container.html(), title.as_deref().unwrap_or("")))
            .unwrap_or_default();

        if html_to_text(&body_html).chars().count() < THIN_BODY_CHARS {
            if let Some(ld_body) = metadata::ld_json_article_body(&doc) {
                let ld_html = paragraphs_to_html(&ld_body);
                if html_to_text(&ld_html).len() > html_to_text(&body_html).len() {
                    body_html = ld_html;
                }
            }
        }

        if body_html.trim().is_empty() {
            return Err(EngineError::NoContent);
        }

        let links = collect_links(&body_html, base);
        Ok(EngineOutput {
            title,
            author: metadata::extract_author(&doc),
            date: metadata::extract_date(&doc),
            body_html,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://news.example.com/story").unwrap()
    }

    #[test]
    fn picks_article_container_and_metadata() {
        let html = r#"<html><head>
            <title>Story | Site</title>
            <meta name="author" content="Reporter">
            <meta property="article:published_time" content="2024-02-01T10:00:00Z">
        </head><body>
            <div class="menu"><a href="/">Home</a></div>
            <article>
                <h1>Story</h1>
                <p>The first paragraph of the story explains what happened, where, and to whom.</p>
                <p>A <a href="/related">second</a> paragraph adds the quotes and the context behind them.</p>
            </article>
        </body></html>"#;
        let out = ArticleEngine.run(html, &base()).unwrap();
        assert_eq!(out.title.as_deref(), Some("Story | Site"));
        assert_eq!(out.author.as_deref(), Some("Reporter"));
        assert_eq!(out.date.as_deref(), Some("2024-02-01"));
        assert!(out.body_html.contains("first paragraph"));
        assert!(!out.body_html.contains("Home"));
        assert_eq!(out.links.len(), 1);
        assert_eq!(out.links[0].href, "https://news.example.com/related");
    }

    #[test]
    fn thin_container_falls_back_to_ld_json() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@type":"NewsArticle","headline":"Headline","articleBody":"Para one is long enough.\n\nPara two <b>escaped</b>."}
            </script>
        </head><body><article><p>Teaser only.</p></article></body></html>"#;
        let out = ArticleEngine.run(html, &base()).unwrap();
        assert_eq!(out.title.as_deref(), Some("Headline"));
        assert!(out.body_html.contains("<p>Para one is long enough.</p>"));
        assert!(out.body_html.contains("&lt;b&gt;escaped&lt;/b&gt;"));
    }

    #[test]
    fn no_container_and_no_ld_json_is_no_content() {
        let html = "<html><body><div><p>Loose text outside any article container.</p></div></body></html>";
        let err = ArticleEngine.run(html, &base()).unwrap_err();
        assert!(matches!(err, EngineError::NoContent));
    }
}
