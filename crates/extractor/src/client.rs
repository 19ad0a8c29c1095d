// ABOUTME: The Client that fetches pages and hands them to the ExtractionSelector.
// ABOUTME: Provides async fetch_url() for one request and fetch_multiple() for ordered, bounded-concurrency batches.

use std::net::ToSocketAddrs;

use futures::stream::{self, StreamExt};
use tracing::{info_span, warn, Instrument, Span};

use crate::error::{ErrorCode, ExtractError};
use crate::options::{ClientBuilder, Options};
use crate::request::FetchRequest;
use crate::resource::{fetch, is_private_ip, FetchOptions, FetchResult};
use crate::result::ExtractionResult;
use crate::selector::ExtractionSelector;

/// Split a comma-separated URL list, trimming entries and dropping empties.
pub fn parse_url_list(urls: &str) -> Vec<String> {
    urls.split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

fn redirect_policy(allow_private: bool) -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= 10 {
            return attempt.error("too many redirects");
        }
        if allow_private {
            return attempt.follow();
        }
        let next = attempt.url().clone();
        let Some(host) = next.host_str() else {
            return attempt.follow();
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            if is_private_ip(&ip) {
                return attempt.error("redirect to private IP blocked");
            }
            return attempt.follow();
        }
        // the policy is synchronous, so resolve with the blocking resolver
        let port = next.port_or_known_default().unwrap_or(80);
        match (host, port).to_socket_addrs() {
            Ok(mut addrs) => {
                if addrs.any(|sa| is_private_ip(&sa.ip())) {
                    attempt.error("redirect to private IP blocked")
                } else {
                    attempt.follow()
                }
            }
            Err(_) => attempt.error("DNS lookup failed during redirect"),
        }
    })
}

/// Fetches pages and extracts their content.
#[derive(Debug, Clone)]
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    selector: ExtractionSelector,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let http_client = opts.http_client.clone().unwrap_or_else(|| {
            reqwest::Client::builder()
                .redirect(redirect_policy(opts.allow_private_networks))
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .unwrap_or_else(|err| {
                    warn!(error = %err, "falling back to a default HTTP client");
                    reqwest::Client::new()
                })
        });
        let selector = ExtractionSelector::new(opts.engines.clone(), opts.min_body_chars);

        Self {
            opts,
            http_client,
            selector,
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn selector(&self) -> &ExtractionSelector {
        &self.selector
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            headers: self.opts.headers.clone(),
            allow_private_networks: self.opts.allow_private_networks,
            max_content_length: self.opts.max_content_length,
        }
    }

    /// Fetch one URL and extract it.
    ///
    /// Network failures (DNS, connection, HTTP status, SSRF, size, timeout)
    /// are returned as `Err`. Everything after a successful fetch, including
    /// "no engine found usable content", is an `Ok` result.
    pub async fn fetch_url(&self, request: &FetchRequest) -> Result<ExtractionResult, ExtractError> {
        let span = info_span!("fetch_url", url = %request.url(), strategy = %request.strategy());
        async {
            let fetched = fetch(
                &self.http_client,
                request.url().as_str(),
                &self.fetch_options(),
            )
            .await?;
            Ok::<_, ExtractError>(self.select_off_thread(request, fetched).await)
        }
        .instrument(span)
        .await
    }

    /// Run the engines on the blocking pool. A caller's timeout then covers
    /// extraction, and other futures keep making progress meanwhile.
    async fn select_off_thread(&self, request: &FetchRequest, fetched: FetchResult) -> ExtractionResult {
        let selector = self.selector.clone();
        let owned = request.clone();
        let span = Span::current();
        let task = tokio::task::spawn_blocking(move || {
            let _guard = span.enter();
            selector.extract(&owned, &fetched.body, fetched.content_type.as_deref())
        });
        match task.await {
            Ok(result) => result,
            Err(err) => {
                warn!(url = %request.url(), error = %err, "extraction task failed");
                ExtractionResult::failure(
                    request.url().as_str(),
                    ErrorCode::EngineFailure,
                    format!("extraction task failed: {}", err),
                )
            }
        }
    }

    /// Extract caller-supplied HTML as if it had been fetched from the request URL.
    pub fn extract_html(&self, request: &FetchRequest, html: &str) -> ExtractionResult {
        let _guard = info_span!("extract_html", url = %request.url()).entered();
        self.selector.extract_html(request, html)
    }

    /// Fetch and extract several URLs concurrently.
    ///
    /// Results come back in input order. Each URL is bounded by the
    /// configured deadline; failures of any kind become failed results for
    /// that URL only.
    pub async fn fetch_multiple(&self, requests: &[FetchRequest]) -> Vec<ExtractionResult> {
        let deadline = self.opts.deadline;
        let mut slots: Vec<Option<ExtractionResult>> = vec![None; requests.len()];

        let mut results = stream::iter(requests.iter().enumerate())
            .map(|(index, request)| async move {
                let url = request.url().as_str();
                let result = match tokio::time::timeout(deadline, self.fetch_url(request)).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(err)) => {
                        warn!(url, error = %err, "fetch failed");
                        ExtractionResult::failure(url, err.code, err.reason())
                    }
                    Err(_) => {
                        warn!(url, ?deadline, "deadline exceeded");
                        ExtractionResult::failure(
                            url,
                            ErrorCode::Timeout,
                            format!("timed out after {:?}", deadline),
                        )
                    }
                };
                (index, result)
            })
            .buffer_unordered(self.opts.concurrency.max(1));

        while let Some((index, result)) = results.next().await {
            slots[index] = Some(result);
        }

        slots.into_iter().flatten().collect()
    }
}
