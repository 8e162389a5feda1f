use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

const SIGNATURE_PREFIX: &str = "sha256=";

/// `sha256=<hex>` HMAC over `message_id + timestamp + body`.
pub fn compute_eventsub_signature(
    secret: &str,
    message_id: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<String> {
    let mac = eventsub_mac(secret, message_id, timestamp, body)?;
    let digest = mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    Ok(format!("{SIGNATURE_PREFIX}{digest}"))
}

pub fn verify_eventsub_signature(
    secret: &str,
    message_id: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
) -> Result<()> {
    let Some(digest_hex) = signature.trim().strip_prefix(SIGNATURE_PREFIX) else {
        bail!("eventsub signature must use sha256=<hex> format");
    };
    let signature_bytes = decode_hex(digest_hex)?;
    eventsub_mac(secret, message_id, timestamp, body)?
        .verify_slice(&signature_bytes)
        .map_err(|_| anyhow!("eventsub signature verification failed"))
}

fn eventsub_mac(
    secret: &str,
    message_id: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<Hmac<Sha256>> {
    if secret.is_empty() {
        bail!("eventsub signing secret is empty");
    }
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .context("failed to initialize eventsub HMAC verifier")?;
    mac.update(message_id.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(body);
    Ok(mac)
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("signature digest cannot be empty");
    }
    if trimmed.len() % 2 != 0 {
        bail!("signature digest must have an even number of hex characters");
    }

    let mut bytes = Vec::with_capacity(trimmed.len() / 2);
    let raw = trimmed.as_bytes();
    let mut index = 0usize;
    while index < raw.len() {
        let hex = std::str::from_utf8(&raw[index..index + 2]).context("invalid utf-8 in digest")?;
        let byte = u8::from_str_radix(hex, 16)
            .with_context(|| format!("invalid hex byte '{hex}' in signature digest"))?;
        bytes.push(byte);
        index = index.saturating_add(2);
    }
    Ok(bytes)
}

/// EventSub timestamps are RFC 3339; a zero `max_skew_seconds` disables the check.
pub(crate) fn validate_timestamp_skew(
    timestamp: &str,
    now: DateTime<Utc>,
    max_skew_seconds: u64,
) -> Result<()> {
    if max_skew_seconds == 0 {
        return Ok(());
    }
    let sent_at = DateTime::parse_from_rfc3339(timestamp.trim())
        .with_context(|| format!("invalid eventsub timestamp '{timestamp}'"))?
        .with_timezone(&Utc);
    let skew = now.signed_duration_since(sent_at).num_seconds().unsigned_abs();
    if skew > max_skew_seconds {
        bail!("eventsub timestamp skew {skew}s exceeds max {max_skew_seconds}s");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{
        compute_eventsub_signature, decode_hex, validate_timestamp_skew,
        verify_eventsub_signature,
    };

    #[test]
    fn unit_compute_eventsub_signature_matches_known_digest() {
        let signature = compute_eventsub_signature(
            "secret",
            "message-1",
            "2021-08-26T17:00:00Z",
            b"{}",
        )
        .expect("signature");
        assert!(signature.starts_with("sha256="));
        assert_eq!(signature.len(), "sha256=".len() + 64);
        verify_eventsub_signature(
            "secret",
            "message-1",
            "2021-08-26T17:00:00Z",
            b"{}",
            &signature,
        )
        .expect("round trip");
    }

    #[test]
    fn regression_verify_rejects_tampered_body_and_malformed_digest() {
        let signature =
            compute_eventsub_signature("secret", "id", "ts", b"body").expect("signature");
        assert!(verify_eventsub_signature("secret", "id", "ts", b"body!", &signature).is_err());
        assert!(verify_eventsub_signature("other", "id", "ts", b"body", &signature).is_err());
        assert!(verify_eventsub_signature("secret", "id", "ts", b"body", "sha256=xyz").is_err());
        assert!(verify_eventsub_signature(
            "secret",
            "id",
            "ts",
            b"body",
            signature.trim_start_matches("sha256=")
        )
        .is_err());
        assert!(compute_eventsub_signature("", "id", "ts", b"body").is_err());
    }

    #[test]
    fn unit_decode_hex_parses_pairs() {
        assert_eq!(decode_hex("00ff10").expect("hex"), vec![0x00, 0xff, 0x10]);
        assert!(decode_hex("abc").is_err());
        assert!(decode_hex("").is_err());
    }

    #[test]
    fn unit_timestamp_skew_allows_ten_minutes() {
        let now = Utc.with_ymd_and_hms(2021, 8, 26, 17, 0, 0).unwrap();
        validate_timestamp_skew("2021-08-26T16:51:00.123456789Z", now, 600).expect("fresh");
        assert!(validate_timestamp_skew("2021-08-26T16:49:00Z", now, 600).is_err());
        assert!(validate_timestamp_skew("not a timestamp", now, 600).is_err());
        validate_timestamp_skew("2021-08-26T10:00:00Z", now, 0).expect("disabled");
    }
}
