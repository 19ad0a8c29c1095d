// ABOUTME: Resource handling module for fetching web pages before extraction.
// ABOUTME: Handles HTTP fetching with SSRF protection, a configurable size limit, and charset decoding.

use std::collections::HashMap;
use std::net::IpAddr;

use bytes::Bytes;
use ipnet::{Ipv4Net, Ipv6Net};
use once_cell::sync::Lazy;
use url::Url;

use crate::error::ExtractError;

/// Default maximum body size in bytes.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 1_000_000;

const OP: &str = "Fetch";

static PRIVATE_V4: Lazy<Vec<Ipv4Net>> = Lazy::new(|| {
    [
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "127.0.0.0/8",
        "169.254.0.0/16",
        "0.0.0.0/8",
    ]
    .iter()
    .filter_map(|net| net.parse().ok())
    .collect()
});
static PRIVATE_V6: Lazy<Vec<Ipv6Net>> = Lazy::new(|| {
    ["fc00::/7", "fe80::/10"]
        .iter()
        .filter_map(|net| net.parse().ok())
        .collect()
});

/// Options for fetching a resource.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    pub allow_private_networks: bool,
    pub max_content_length: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            allow_private_networks: false,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
        }
    }
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as text, using the content-type charset or detection.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Check if an IP address is in a private, loopback or link-local range.
pub(crate) fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => PRIVATE_V4.iter().any(|net| net.contains(ip)),
        IpAddr::V6(ip) => {
            if ip.is_loopback() || ip.is_unspecified() {
                return true;
            }
            if let Some(mapped) = ip.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            PRIVATE_V6.iter().any(|net| net.contains(ip))
        }
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// Reject targets that resolve to private addresses.
async fn guard_host(url: &str, target: &Url, what: &str) -> Result<(), ExtractError> {
    let Some(host) = target.host_str() else {
        return Ok(());
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(ExtractError::ssrf(
                url,
                OP,
                Some(anyhow::anyhow!("{} resolves to a private IP address", what)),
            ));
        }
        return Ok(());
    }

    let port = target.port_or_known_default().unwrap_or(80);
    let addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
        ExtractError::fetch(url, OP, Some(anyhow::anyhow!("DNS lookup failed: {}", e)))
    })?;
    for socket_addr in addrs {
        if is_private_ip(&socket_addr.ip()) {
            return Err(ExtractError::ssrf(
                url,
                OP,
                Some(anyhow::anyhow!("{} resolves to a private IP address", what)),
            ));
        }
    }
    Ok(())
}

fn request_error(url: &str, context: &str, err: reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        ExtractError::timeout(url, OP, Some(anyhow::anyhow!("{}: {}", context, err)))
    } else {
        ExtractError::fetch(url, OP, Some(anyhow::anyhow!("{}: {}", context, err)))
    }
}

/// Fetch a resource from the given URL.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, ExtractError> {
    if url.is_empty() {
        return Err(ExtractError::invalid_url(url, OP, None));
    }

    let parsed_url = Url::parse(url).map_err(|e| {
        ExtractError::invalid_url(url, OP, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ExtractError::invalid_url(
            url,
            OP,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    if !opts.allow_private_networks {
        guard_host(url, &parsed_url, "target").await?;
    }

    let mut request = client.get(url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    let response = request
        .send()
        .await
        .map_err(|e| request_error(url, "request failed", e))?;

    // redirects may have moved us somewhere private
    if !opts.allow_private_networks && response.url() != &parsed_url {
        guard_host(url, response.url(), "redirect target").await?;
    }

    let content_length = response.content_length().or_else(|| {
        response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
    });
    if let Some(len) = content_length {
        if len > opts.max_content_length as u64 {
            return Err(ExtractError::too_large(url, OP, opts.max_content_length));
        }
    }

    let status = response.status();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    if !status.is_success() {
        return Err(ExtractError::fetch(
            url,
            OP,
            Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| request_error(url, "failed to read body", e))?;

    if body.len() > opts.max_content_length {
        return Err(ExtractError::too_large(url, OP, opts.max_content_length));
    }

    Ok(FetchResult {
        status: status.as_u16(),
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}
