//! OAuth 1.0a request signing (HMAC-SHA1) for the social-media APIs.
//!
//! Every request is signed independently. Query parameters take part in the
//! signature base string, so callers must sign with exactly the parameters
//! they send.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::http_helpers::percent_encode;

#[derive(Clone, PartialEq, Eq)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token_key: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token_key", &self.access_token_key)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth1Nonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl OAuth1Nonce {
    pub fn generate(timestamp: i64) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(nanos.to_le_bytes());
        hasher.update(sequence.to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());
        let digest = hasher.finalize();
        let nonce = digest
            .iter()
            .take(16)
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();
        Self { nonce, timestamp }
    }
}

/// `METHOD&enc(url)&enc(sorted params)` per RFC 5849 section 3.4.1.
pub fn signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    let mut encoded = params
        .iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>();
    encoded.sort();
    let normalized = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(base_url),
        percent_encode(&normalized)
    )
}

fn protocol_params(credentials: &OAuth1Credentials, nonce: &OAuth1Nonce) -> Vec<(String, String)> {
    vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_nonce".to_string(), nonce.nonce.clone()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), nonce.timestamp.to_string()),
        ("oauth_token".to_string(), credentials.access_token_key.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ]
}

pub fn sign(
    credentials: &OAuth1Credentials,
    method: &str,
    base_url: &str,
    request_params: &[(String, String)],
    nonce: &OAuth1Nonce,
) -> Result<String> {
    let mut params = protocol_params(credentials, nonce);
    params.extend(request_params.iter().cloned());
    let base_string = signature_base_string(method, base_url, &params);
    let signing_key = format!(
        "{}&{}",
        percent_encode(&credentials.consumer_secret),
        percent_encode(&credentials.access_token_secret)
    );
    let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
        .context("failed to initialize oauth HMAC signer")?;
    mac.update(base_string.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Builds the `Authorization: OAuth ...` header value for one request.
pub fn authorization_header(
    credentials: &OAuth1Credentials,
    method: &str,
    base_url: &str,
    request_params: &[(String, String)],
    nonce: &OAuth1Nonce,
) -> Result<String> {
    let signature = sign(credentials, method, base_url, request_params, nonce)?;
    let mut params = protocol_params(credentials, nonce);
    params.push(("oauth_signature".to_string(), signature));
    params.sort();
    let fields = params
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {fields}"))
}
