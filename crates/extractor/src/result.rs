// ABOUTME: ExtractionResult record produced once per request, plus EngineKind, Link and Citation.
// ABOUTME: Includes markdown rendering helpers for single results and batches.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// The extraction engines, in the order AUTO tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Article-oriented extractor, highest fidelity.
    Trafilatura,
    /// Generic readability scoring.
    Readability,
    /// Tag-stripping fallback.
    Basic,
}

impl EngineKind {
    /// Fixed priority order used by the auto strategy.
    pub const AUTO_ORDER: [EngineKind; 3] = [
        EngineKind::Trafilatura,
        EngineKind::Readability,
        EngineKind::Basic,
    ];
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineKind::Trafilatura => "trafilatura",
            EngineKind::Readability => "readability",
            EngineKind::Basic => "basic",
        };
        write!(f, "{}", s)
    }
}

/// A hyperlink found in the extracted body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// The normalized outcome of extracting one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    pub engine_used: Option<EngineKind>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
    pub body_markdown: String,
    pub links: Vec<Link>,
    pub succeeded: bool,
    pub failure_reason: Option<String>,
    pub error_code: Option<ErrorCode>,
}

/// Document metadata carried into a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
}

impl ExtractionResult {
    /// Build a successful result.
    pub fn success(
        url: impl Into<String>,
        engine: EngineKind,
        meta: DocumentMeta,
        body_markdown: String,
        links: Vec<Link>,
    ) -> Self {
        Self {
            url: url.into(),
            engine_used: Some(engine),
            title: meta.title,
            author: meta.author,
            published_date: meta.published_date,
            body_markdown,
            links,
            succeeded: true,
            failure_reason: None,
            error_code: None,
        }
    }

    /// Build a failed result carrying a human-readable reason.
    pub fn failure(url: impl Into<String>, code: ErrorCode, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            engine_used: None,
            title: None,
            author: None,
            published_date: None,
            body_markdown: String::new(),
            links: Vec::new(),
            succeeded: false,
            failure_reason: Some(reason.into()),
            error_code: Some(code),
        }
    }

    /// Render the result as markdown for display to a reader or model.
    ///
    /// With `show_metadata`, a header carrying title, source, author and date
    /// precedes the body, separated by a horizontal rule.
    pub fn render_markdown(&self, show_metadata: bool) -> String {
        if !self.succeeded {
            return format!(
                "Could not extract content from {}: {}",
                self.url,
                self.failure_reason.as_deref().unwrap_or("unknown error")
            );
        }

        if !show_metadata {
            return self.body_markdown.clone();
        }

        let mut parts = Vec::new();
        parts.push(format!(
            "# {}",
            non_empty(&self.title).unwrap_or("Web Content")
        ));
        parts.push(format!("**Source:** {}", self.url));
        if let Some(author) = non_empty(&self.author) {
            parts.push(format!("**Author:** {}", author));
        }
        if let Some(date) = non_empty(&self.published_date) {
            parts.push(format!("**Date:** {}", date));
        }
        parts.push("---".to_string());
        if !self.body_markdown.is_empty() {
            parts.push(self.body_markdown.clone());
        }

        parts.join("\n\n")
    }

    /// Build the citation record for this result. Returns None for failed results.
    pub fn citation(&self, accessed_at: DateTime<Utc>) -> Option<Citation> {
        if !self.succeeded {
            return None;
        }
        Some(Citation {
            source_name: non_empty(&self.title).unwrap_or(self.url.as_str()).to_string(),
            url: self.url.clone(),
            date_accessed: accessed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            author: non_empty(&self.author).map(str::to_string),
            published_date: non_empty(&self.published_date).map(str::to_string),
            document: self.body_markdown.clone(),
        })
    }
}

/// Citation block describing where extracted content came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source_name: String,
    pub url: String,
    pub date_accessed: String,
    pub author: Option<String>,
    pub published_date: Option<String>,
    pub document: String,
}

/// Render several results, in order, separated by horizontal rules.
pub fn render_batch(results: &[ExtractionResult], show_metadata: bool) -> String {
    results
        .iter()
        .map(|r| r.render_markdown(show_metadata))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
