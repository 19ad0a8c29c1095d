// ABOUTME: FetchRequest and Strategy types describing what to fetch and how to extract it.
// ABOUTME: Requests are validated on construction and immutable afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ExtractError;
use crate::result::EngineKind;

/// Which engines the selector may try for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Try every engine in fixed priority order until one produces usable output.
    #[default]
    Auto,
    Trafilatura,
    Readability,
    Basic,
}

impl Strategy {
    /// Engines to attempt, in order.
    pub fn engines(self) -> &'static [EngineKind] {
        match self {
            Strategy::Auto => &EngineKind::AUTO_ORDER,
            Strategy::Trafilatura => &[EngineKind::Trafilatura],
            Strategy::Readability => &[EngineKind::Readability],
            Strategy::Basic => &[EngineKind::Basic],
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Auto => "auto",
            Strategy::Trafilatura => "trafilatura",
            Strategy::Readability => "readability",
            Strategy::Basic => "basic",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Strategy {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Strategy::Auto),
            "trafilatura" => Ok(Strategy::Trafilatura),
            "readability" => Ok(Strategy::Readability),
            "basic" => Ok(Strategy::Basic),
            _ => Err(ExtractError::invalid_strategy(s)),
        }
    }
}

/// A validated request to fetch and extract one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: Url,
    strategy: Strategy,
    include_links: bool,
    include_metadata: bool,
}

impl FetchRequest {
    /// Create a request for an absolute http(s) URL with default settings
    /// (auto strategy, links and metadata included).
    pub fn new(url: &str) -> Result<Self, ExtractError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::invalid_url(url, "FetchRequest", None));
        }

        let parsed = Url::parse(trimmed).map_err(|e| {
            ExtractError::invalid_url(
                url,
                "FetchRequest",
                Some(anyhow::anyhow!(
                    "please provide a complete URL (e.g. https://example.com): {}",
                    e
                )),
            )
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ExtractError::invalid_url(
                url,
                "FetchRequest",
                Some(anyhow::anyhow!("scheme must be http or https")),
            ));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ExtractError::invalid_url(
                url,
                "FetchRequest",
                Some(anyhow::anyhow!("URL has no host")),
            ));
        }

        Ok(Self {
            url: parsed,
            strategy: Strategy::Auto,
            include_links: true,
            include_metadata: true,
        })
    }

    pub fn with_strategy(self, strategy: Strategy) -> Self {
        Self { strategy, ..self }
    }

    pub fn with_links(self, include_links: bool) -> Self {
        Self {
            include_links,
            ..self
        }
    }

    pub fn with_metadata(self, include_metadata: bool) -> Self {
        Self {
            include_metadata,
            ..self
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn include_links(&self) -> bool {
        self.include_links
    }

    pub fn include_metadata(&self) -> bool {
        self.include_metadata
    }
}
