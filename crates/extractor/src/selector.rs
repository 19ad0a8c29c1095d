// ABOUTME: ExtractionSelector: classify the fetched content, run engines in strategy order, keep the first good body.
// ABOUTME: Pure and deterministic; engine errors and panics are recorded as failed attempts, never propagated.

//! Engine selection.
//!
//! [`ExtractionSelector::extract`] never fails: every outcome, including
//! "nothing usable", is an [`ExtractionResult`]. The auto strategy walks
//! [`EngineKind::AUTO_ORDER`] and stops at the first engine whose body passes
//! the quality check; a specific strategy runs only its own engine.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use scraper::Html;
use tracing::{debug, info};
use url::Url;

use crate::engines::{EngineOutput, EngineSet};
use crate::error::ErrorCode;
use crate::formats::{normalize_body, normalized_text_len, sanitize_html};
use crate::metadata::{document_meta, normalize_date};
use crate::request::FetchRequest;
use crate::resource::decode_body;
use crate::result::{DocumentMeta, EngineKind, ExtractionResult, Link};

/// Minimum whitespace-normalized text length of an acceptable body.
pub const DEFAULT_MIN_BODY_CHARS: usize = 40;

const HTML_PREFIXES: &[&str] = &["<!doctype html", "<html", "<head", "<body"];

/// How fetched content is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// Run the engines.
    Html,
    /// Return the decoded text as the body.
    Text,
    /// Refuse; engines never see it.
    Binary,
}

/// Classify a response by its declared media type, sniffing the bytes when
/// no type was given.
pub fn classify(content_type: Option<&str>, body: &[u8]) -> ContentClass {
    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mt| mt.trim().to_ascii_lowercase())
        .filter(|mt| !mt.is_empty());

    let Some(media_type) = media_type else {
        return sniff(body);
    };

    match media_type.as_str() {
        "text/html" | "application/xhtml+xml" => ContentClass::Html,
        "application/json" | "application/xml" => ContentClass::Text,
        mt if mt.starts_with("text/") || mt.ends_with("+json") || mt.ends_with("+xml") => {
            ContentClass::Text
        }
        _ => ContentClass::Binary,
    }
}

fn sniff(body: &[u8]) -> ContentClass {
    const BINARY_MAGIC: &[&[u8]] = &[
        b"%PDF-",
        b"\x89PNG",
        b"\xFF\xD8\xFF",
        b"GIF87a",
        b"GIF89a",
        b"RIFF",
        b"PK\x03\x04",
    ];
    if BINARY_MAGIC.iter().any(|magic| body.starts_with(magic)) {
        return ContentClass::Binary;
    }

    let head = &body[..body.len().min(1024)];
    let head = String::from_utf8_lossy(head).trim_start().to_ascii_lowercase();
    if HTML_PREFIXES.iter().any(|prefix| head.starts_with(prefix)) {
        return ContentClass::Html;
    }

    if body.contains(&0) {
        ContentClass::Binary
    } else {
        ContentClass::Text
    }
}

/// Result of running one engine during a selection pass.
#[derive(Debug)]
struct EngineAttempt {
    engine: EngineKind,
    outcome: Result<EngineOutput, String>,
}

impl EngineAttempt {
    fn reason(&self) -> Option<String> {
        self.outcome
            .as_ref()
            .err()
            .map(|reason| format!("{}: {}", self.engine, reason))
    }
}

/// Chooses an engine for each request and normalizes the winner's output.
#[derive(Debug, Clone)]
pub struct ExtractionSelector {
    engines: EngineSet,
    min_body_chars: usize,
}

impl Default for ExtractionSelector {
    fn default() -> Self {
        Self::new(EngineSet::builtin(), DEFAULT_MIN_BODY_CHARS)
    }
}

impl ExtractionSelector {
    pub fn new(engines: EngineSet, min_body_chars: usize) -> Self {
        Self {
            engines,
            min_body_chars,
        }
    }

    pub fn min_body_chars(&self) -> usize {
        self.min_body_chars
    }

    /// Extract one fetched document.
    pub fn extract(
        &self,
        request: &FetchRequest,
        body: &[u8],
        content_type: Option<&str>,
    ) -> ExtractionResult {
        let url = request.url().as_str();

        match classify(content_type, body) {
            ContentClass::Binary => {
                let kind = content_type
                    .map(str::trim)
                    .filter(|ct| !ct.is_empty())
                    .unwrap_or("binary data");
                info!(url, content_type = kind, "refusing non-text content");
                ExtractionResult::failure(
                    url,
                    ErrorCode::UnsupportedContentType,
                    format!("{}: {}", ErrorCode::UnsupportedContentType, kind),
                )
            }
            ContentClass::Text => {
                let text = decode_body(body, content_type);
                let text = text.trim();
                if text.is_empty() {
                    return ExtractionResult::failure(
                        url,
                        ErrorCode::EngineFailure,
                        "empty response body",
                    );
                }
                info!(url, chars = text.chars().count(), "passing text content through");
                ExtractionResult::success(
                    url,
                    EngineKind::Basic,
                    DocumentMeta::default(),
                    text.to_string(),
                    Vec::new(),
                )
            }
            ContentClass::Html => {
                let html = decode_body(body, content_type);
                self.extract_html(request, &html)
            }
        }
    }

    /// Run the strategy's engines over already-decoded HTML.
    pub fn extract_html(&self, request: &FetchRequest, html: &str) -> ExtractionResult {
        let url = request.url();
        let mut failures = Vec::new();

        for &kind in request.strategy().engines() {
            match self.attempt(kind, html, url) {
                EngineAttempt {
                    engine,
                    outcome: Ok(output),
                } => {
                    info!(url = %url, %engine, "extraction succeeded");
                    return self.finish(request, html, engine, output);
                }
                failed => failures.push(failed),
            }
        }

        let reason = failures
            .iter()
            .filter_map(EngineAttempt::reason)
            .collect::<Vec<_>>()
            .join("; ");
        info!(url = %url, %reason, "all engines failed");
        ExtractionResult::failure(url.as_str(), ErrorCode::EngineFailure, reason)
    }

    fn attempt(&self, kind: EngineKind, html: &str, url: &Url) -> EngineAttempt {
        let engine = self.engines.get(kind);
        let outcome = match catch_unwind(AssertUnwindSafe(|| engine.run(html, url))) {
            Ok(Ok(output)) => {
                let chars = normalized_text_len(&sanitize_html(&output.body_html));
                debug!(engine = %kind, chars, "engine produced output");
                if chars >= self.min_body_chars {
                    Ok(output)
                } else {
                    Err(format!(
                        "content below quality threshold ({} < {} chars)",
                        chars, self.min_body_chars
                    ))
                }
            }
            Ok(Err(err)) => {
                debug!(engine = %kind, error = %err, "engine failed");
                Err(err.to_string())
            }
            Err(_) => {
                debug!(engine = %kind, "engine panicked");
                Err("engine panicked".to_string())
            }
        };
        EngineAttempt {
            engine: kind,
            outcome,
        }
    }

    fn finish(
        &self,
        request: &FetchRequest,
        html: &str,
        engine: EngineKind,
        output: EngineOutput,
    ) -> ExtractionResult {
        let body_markdown = normalize_body(&output.body_html, request.include_links());

        let links = if request.include_links() {
            resolve_links(output.links, request.url())
        } else {
            Vec::new()
        };

        let meta = if request.include_metadata() {
            let document = document_meta(&Html::parse_document(html));
            DocumentMeta {
                title: non_blank(output.title).or(document.title),
                author: non_blank(output.author).or(document.author),
                published_date: output
                    .date
                    .as_deref()
                    .and_then(normalize_date)
                    .or(document.published_date),
            }
        } else {
            DocumentMeta::default()
        };

        ExtractionResult::success(request.url().as_str(), engine, meta, body_markdown, links)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve hrefs against the request URL and keep the first of each.
fn resolve_links(links: Vec<Link>, base: &Url) -> Vec<Link> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter_map(|link| {
            let href = base.join(link.href.trim()).ok()?.to_string();
            seen.insert(href.clone()).then_some(Link {
                text: link.text,
                href,
            })
        })
        .collect()
}
