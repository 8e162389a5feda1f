use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const USER_AGENT: &str = "helpdesk-shows";

pub(crate) fn build_http_client(
    headers: reqwest::header::HeaderMap,
    request_timeout_ms: u64,
    client_name: &str,
) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_millis(request_timeout_ms.max(1)))
        .build()
        .with_context(|| format!("failed to create {client_name} api client"))
}

pub(crate) fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// RFC 3986 percent-encoding: only unreserved characters pass through.
pub(crate) fn percent_encode(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}
