// ABOUTME: Configuration options for the extractor client: HTTP settings, quality threshold and batch limits.
// ABOUTME: ClientBuilder provides a fluent API for constructing Client instances with custom settings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::client::Client;
use crate::engines::{Engine, EngineSet};
use crate::resource::DEFAULT_MAX_CONTENT_LENGTH;
use crate::result::EngineKind;
use crate::selector::DEFAULT_MIN_BODY_CHARS;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Configuration options for the extractor client.
#[derive(Debug, Clone)]
pub struct Options {
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    pub user_agent: String,
    pub allow_private_networks: bool,
    /// Largest body accepted, in bytes.
    pub max_content_length: usize,
    /// Quality threshold: whitespace-normalized characters a body must reach.
    pub min_body_chars: usize,
    /// How many URLs a batch works on at once.
    pub concurrency: usize,
    /// Upper bound on fetch plus extraction for each URL of a batch.
    pub deadline: Duration,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
    pub engines: EngineSet,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allow_private_networks: false,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            min_body_chars: DEFAULT_MIN_BODY_CHARS,
            concurrency: 4,
            deadline: Duration::from_secs(45),
            http_client: None,
            headers: HashMap::new(),
            engines: EngineSet::builtin(),
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Allow or disallow requests to private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    pub fn max_content_length(mut self, bytes: usize) -> Self {
        self.opts.max_content_length = bytes;
        self
    }

    pub fn min_body_chars(mut self, chars: usize) -> Self {
        self.opts.min_body_chars = chars;
        self
    }

    /// Set batch concurrency; zero is treated as one.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.opts.concurrency = n.max(1);
        self
    }

    /// Set the per-URL deadline used by batches.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.opts.deadline = deadline;
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Replace the engine used for one kind.
    pub fn engine(mut self, kind: EngineKind, engine: Arc<dyn Engine>) -> Self {
        self.opts.engines = self.opts.engines.with_engine(kind, engine);
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = Options::default();
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.max_content_length, 1_000_000);
        assert_eq!(opts.min_body_chars, 40);
        assert_eq!(opts.concurrency, 4);
        assert_eq!(opts.deadline, Duration::from_secs(45));
        assert!(opts.user_agent.starts_with("Mozilla/5.0"));
        assert!(!opts.allow_private_networks);
    }

    #[test]
    fn builder_clamps_concurrency() {
        let builder = ClientBuilder::new().concurrency(0);
        assert_eq!(builder.opts.concurrency, 1);
    }
}
