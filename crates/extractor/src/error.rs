// ABOUTME: Error types for the extractor including the ErrorCode enum and ExtractError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes representing different categories of extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidUrl,
    InvalidStrategy,
    Fetch,
    Timeout,
    Ssrf,
    TooLarge,
    UnsupportedContentType,
    EngineFailure,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::InvalidStrategy => "invalid strategy",
            ErrorCode::Fetch => "network error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Ssrf => "SSRF blocked",
            ErrorCode::TooLarge => "content too large",
            ErrorCode::UnsupportedContentType => "unsupported content type",
            ErrorCode::EngineFailure => "extraction failed",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for fetch and extraction operations.
#[derive(Debug, thiserror::Error)]
pub struct ExtractError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "webcontent: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ExtractError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create an InvalidStrategy error naming the rejected method.
    pub fn invalid_strategy(method: &str) -> Self {
        Self::with_code(
            ErrorCode::InvalidStrategy,
            "",
            "ParseStrategy",
            Some(anyhow::anyhow!(
                "unknown extraction method '{}' (expected auto, trafilatura, readability or basic)",
                method
            )),
        )
    }

    /// Create a Fetch (network) error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Timeout, url, op, source)
    }

    /// Create an SSRF error.
    pub fn ssrf(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Ssrf, url, op, source)
    }

    /// Create a TooLarge error.
    pub fn too_large(url: impl Into<String>, op: impl Into<String>, limit: usize) -> Self {
        Self::with_code(
            ErrorCode::TooLarge,
            url,
            op,
            Some(anyhow::anyhow!("maximum is {} bytes", limit)),
        )
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is an SSRF error.
    pub fn is_ssrf(&self) -> bool {
        self.code == ErrorCode::Ssrf
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a TooLarge error.
    pub fn is_too_large(&self) -> bool {
        self.code == ErrorCode::TooLarge
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Human-readable reason without the operation prefix, used in failed results.
    pub fn reason(&self) -> String {
        match self.source {
            Some(ref src) => format!("{}: {}", self.code, src),
            None => self.code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_url_and_source() {
        let err = ExtractError::fetch(
            "https://example.com",
            "Fetch",
            Some(anyhow::anyhow!("HTTP status 404")),
        );
        assert_eq!(
            err.to_string(),
            "webcontent: Fetch https://example.com: network error: HTTP status 404"
        );
        assert!(err.is_fetch());
        assert_eq!(err.reason(), "network error: HTTP status 404");
    }

    #[test]
    fn invalid_strategy_names_method() {
        let err = ExtractError::invalid_strategy("magic");
        assert_eq!(err.code, ErrorCode::InvalidStrategy);
        assert!(err.to_string().contains("'magic'"));
    }

    #[test]
    fn error_code_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCode::UnsupportedContentType).unwrap();
        assert_eq!(json, "\"unsupported_content_type\"");
    }
}
