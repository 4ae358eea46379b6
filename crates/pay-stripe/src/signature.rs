//! # Webhook Signature Verification
//!
//! Stripe signs each webhook delivery with HMAC-SHA256 over
//! `"{timestamp}.{raw body}"` and sends the result in the
//! `Stripe-Signature` header as `t=<unix ts>,v1=<hex>[,v1=<hex>...]`.

use hmac::{Hmac, Mac};
use pay_core::{PaymentError, PaymentResult};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parsed `Stripe-Signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// All `v1` signatures (more than one during secret rotation)
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    /// Parse the header; unknown schemes (e.g. `v0`) are ignored.
    pub fn parse(header: &str) -> PaymentResult<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    timestamp = value.parse().ok();
                }
                "v1" => {
                    signatures.push(value.to_string());
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            PaymentError::WebhookVerificationFailed(
                "Unable to extract timestamp and signatures from header".to_string(),
            )
        })?;

        if signatures.is_empty() {
            return Err(PaymentError::WebhookVerificationFailed(
                "No signatures found with expected scheme".to_string(),
            ));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Hex-encoded v1 signature for a payload
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(mac_for(secret, timestamp, payload).finalize().into_bytes())
}

/// Build a complete `Stripe-Signature` header value.
///
/// Used by tests and local tooling to produce deliveries the server accepts.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!(
        "t={},v1={}",
        timestamp,
        compute_signature(secret, timestamp, payload)
    )
}

/// Verify a delivery against the signing secret at time `now` (unix seconds).
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: u64,
    now: i64,
) -> PaymentResult<()> {
    let parsed = SignatureHeader::parse(header)?;

    let valid = parsed.signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| {
                mac_for(secret, parsed.timestamp, payload)
                    .verify_slice(&bytes)
                    .is_ok()
            })
            .unwrap_or(false)
    });

    if !valid {
        return Err(PaymentError::WebhookVerificationFailed(
            "No signatures found matching the expected signature for payload".to_string(),
        ));
    }

    if now.abs_diff(parsed.timestamp) > tolerance_secs {
        return Err(PaymentError::WebhookVerificationFailed(
            "Timestamp outside the tolerance zone".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

    #[test]
    fn test_parse_signature_header() {
        let parsed = SignatureHeader::parse("t=1234567890,v1=abc123,v1=def456,v0=zzz").unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures, vec!["abc123", "def456"]);
    }

    #[test]
    fn test_parse_rejects_incomplete_headers() {
        assert!(SignatureHeader::parse("v1=abc123").is_err());
        assert!(SignatureHeader::parse("t=1234567890").is_err());
        assert!(SignatureHeader::parse("").is_err());
    }

    #[test]
    fn test_signature_is_hex_sha256() {
        let sig = compute_signature(SECRET, 1234567890, b"{}");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_accepts_valid_signature() {
        let now = 1_700_000_000;
        let header = signature_header(SECRET, now, PAYLOAD);

        assert!(verify_signature(PAYLOAD, &header, SECRET, 300, now).is_ok());
        assert!(verify_signature(PAYLOAD, &header, SECRET, 300, now + 299).is_ok());
    }

    #[test]
    fn test_verify_accepts_any_matching_v1() {
        let now = 1_700_000_000;
        let good = compute_signature(SECRET, now, PAYLOAD);
        let header = format!("t={},v1=deadbeef,v1={}", now, good);

        assert!(verify_signature(PAYLOAD, &header, SECRET, 300, now).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let now = 1_700_000_000;
        let header = signature_header("whsec_other", now, PAYLOAD);

        let err = verify_signature(PAYLOAD, &header, SECRET, 300, now).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let now = 1_700_000_000;
        let header = signature_header(SECRET, now, PAYLOAD);

        let tampered = br#"{"id":"evt_2","type":"payment_intent.succeeded"}"#;
        assert!(verify_signature(tampered, &header, SECRET, 300, now).is_err());
    }

    #[test]
    fn test_verify_rejects_stale_timestamp() {
        let signed_at = 1_700_000_000;
        let header = signature_header(SECRET, signed_at, PAYLOAD);

        let err = verify_signature(PAYLOAD, &header, SECRET, 300, signed_at + 301).unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn test_verify_rejects_extreme_timestamps() {
        let now = 1_700_000_000;
        for signed_at in [i64::MIN, i64::MAX] {
            let header = signature_header(SECRET, signed_at, PAYLOAD);
            let err = verify_signature(PAYLOAD, &header, SECRET, 300, now).unwrap_err();
            assert!(err.to_string().contains("tolerance"));
        }
    }

    #[test]
    fn test_verify_rejects_non_hex_signature() {
        let header = "t=1700000000,v1=not-hex";
        assert!(verify_signature(PAYLOAD, header, SECRET, 300, 1_700_000_000).is_err());
    }
}
