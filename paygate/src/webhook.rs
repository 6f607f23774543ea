//! Webhook signature verification.
//!
//! Every delivery carries a `Paygate-Signature` header:
//!
//! ```text
//! Paygate-Signature: t=1717236000,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! `v1` is the hex-encoded HMAC-SHA256 of `"{t}.{raw body}"` keyed with the
//! endpoint secret. During secret rotation the header carries one `v1` per
//! active secret; a match against any of them is accepted.
//!
//! # Examples
//!
//! ```
//! use paygate::webhook::WebhookVerifier;
//!
//! # fn example() -> paygate::error::Result<()> {
//! let verifier = WebhookVerifier::new("whsec_test_secret")?;
//! let payload = br#"{"object":"event","id":"evnt_1"}"#;
//!
//! let header = verifier.sign(payload, 1_717_236_000);
//! verifier.verify(payload, &header, 1_717_236_030)?;
//! assert!(verifier.verify(b"tampered", &header, 1_717_236_030).is_err());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::{fmt, time::Duration};

use chrono::Utc;
use ring::hmac;
use tracing::debug;

use crate::{
    error::{PaygateError, Result},
    resources::events::Event,
};

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "Paygate-Signature";

/// Prefix of webhook endpoint secrets.
pub const SECRET_PREFIX: &str = "whsec_";

/// Maximum accepted age (and clock skew) of a signature timestamp.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

const SCHEME: &str = "v1";

/// Verifies and produces webhook signatures for one endpoint secret.
pub struct WebhookVerifier {
    key: hmac::Key,
    tolerance: Duration,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"[REDACTED]")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl WebhookVerifier {
    /// Creates a verifier for `secret` (`whsec_...`).
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if the secret does not start with
    /// `whsec_` or has nothing after the prefix.
    pub fn new(secret: &str) -> Result<Self> {
        match secret.strip_prefix(SECRET_PREFIX) {
            Some(rest) if !rest.is_empty() => Ok(Self {
                key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
                tolerance: DEFAULT_TOLERANCE,
            }),
            _ => Err(PaygateError::Config(format!(
                "webhook secret must start with '{SECRET_PREFIX}'"
            ))),
        }
    }

    /// Sets the accepted timestamp window.
    #[must_use]
    pub const fn tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Signs `payload` at `timestamp` (unix seconds), returning the header value.
    #[must_use]
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let tag = hmac::sign(&self.key, &signed_payload(timestamp, payload));
        format!("t={timestamp},{SCHEME}={}", hex::encode(tag.as_ref()))
    }

    /// Checks `header` against `payload` at time `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::WebhookSignature`] if the header is malformed,
    /// the timestamp is outside the tolerance or no signature matches.
    pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<()> {
        let parsed = SignatureHeader::parse(header)?;

        let age = now.abs_diff(parsed.timestamp);
        if age > self.tolerance.as_secs() {
            debug!(timestamp = parsed.timestamp, now, "webhook timestamp outside tolerance");
            return Err(PaygateError::WebhookSignature(format!(
                "timestamp {} is {age}s away from now, tolerance is {}s",
                parsed.timestamp,
                self.tolerance.as_secs()
            )));
        }

        let message = signed_payload(parsed.timestamp, payload);
        let matched = parsed
            .signatures
            .iter()
            .filter_map(|sig| hex::decode(sig).ok())
            .any(|sig| hmac::verify(&self.key, &message, &sig).is_ok());
        if !matched {
            return Err(PaygateError::WebhookSignature("no matching v1 signature".to_owned()));
        }
        Ok(())
    }

    /// Verifies a delivery against the current time and decodes its event.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::WebhookSignature`] when verification fails and
    /// [`PaygateError::Decode`] when the verified body is not an event.
    pub fn construct_event(&self, payload: &[u8], header: &str) -> Result<Event> {
        self.verify(payload, header, Utc::now().timestamp())?;
        serde_json::from_slice(payload).map_err(|e| PaygateError::Decode(format!("webhook event: {e}")))
    }
}

fn signed_payload(timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let prefix = format!("{timestamp}.");
    let mut message = Vec::with_capacity(prefix.len() + payload.len());
    message.extend_from_slice(prefix.as_bytes());
    message.extend_from_slice(payload);
    message
}

#[derive(Debug)]
struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

impl<'a> SignatureHeader<'a> {
    fn parse(header: &'a str) -> Result<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    let parsed = value.parse::<i64>().map_err(|_| {
                        PaygateError::WebhookSignature(format!("invalid timestamp '{value}'"))
                    })?;
                    timestamp = Some(parsed);
                }
                SCHEME => signatures.push(value),
                // other schemes are ignored
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| PaygateError::WebhookSignature("header has no timestamp".to_owned()))?;
        if signatures.is_empty() {
            return Err(PaygateError::WebhookSignature("header has no v1 signature".to_owned()));
        }
        Ok(Self { timestamp, signatures })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::resources::events::tests::event_json;

    const NOW: i64 = 1_717_236_000;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new("whsec_test_secret").unwrap()
    }

    #[test]
    fn test_new_requires_prefix() {
        assert!(matches!(WebhookVerifier::new("secret"), Err(PaygateError::Config(_))));
        assert!(WebhookVerifier::new("whsec_").is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        assert!(format!("{:?}", verifier()).contains("[REDACTED]"));
    }

    #[test]
    fn test_sign_format() {
        let header = verifier().sign(b"{}", NOW);
        let (t, v1) = header.split_once(',').unwrap();
        assert_eq!(t, "t=1717236000");
        let sig = v1.strip_prefix("v1=").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let other = WebhookVerifier::new("whsec_other").unwrap();
        let header = other.sign(b"{}", NOW);
        assert!(matches!(verifier().verify(b"{}", &header, NOW), Err(PaygateError::WebhookSignature(_))));
    }

    #[test]
    fn test_verify_accepts_any_v1_during_rotation() {
        let current = verifier().sign(b"{}", NOW);
        let old_sig = WebhookVerifier::new("whsec_old").unwrap().sign(b"{}", NOW);
        let old_v1 = old_sig.split_once(',').unwrap().1;
        let new_v1 = current.split_once(',').unwrap().1;

        let header = format!("t={NOW},{old_v1},{new_v1},v0=ignored");
        assert!(verifier().verify(b"{}", &header, NOW).is_ok());
    }

    #[test]
    fn test_verify_tolerance() {
        let header = verifier().sign(b"{}", NOW);
        assert!(verifier().verify(b"{}", &header, NOW + 300).is_ok());
        assert!(verifier().verify(b"{}", &header, NOW + 301).is_err());
        assert!(verifier().verify(b"{}", &header, NOW - 301).is_err());

        let strict = verifier().tolerance(Duration::from_secs(10));
        assert!(strict.verify(b"{}", &header, NOW + 11).is_err());
    }

    #[test]
    fn test_verify_malformed_headers() {
        let v = verifier();
        for header in ["", "t=abc,v1=00", "v1=00", "t=1717236000", "t=1717236000,v1=zz"] {
            assert!(
                matches!(v.verify(b"{}", header, NOW), Err(PaygateError::WebhookSignature(_))),
                "accepted {header:?}"
            );
        }
    }

    #[test]
    fn test_construct_event() {
        let v = verifier();
        let payload = serde_json::to_vec(&event_json()).unwrap();
        let header = v.sign(&payload, Utc::now().timestamp());

        let event = v.construct_event(&payload, &header).unwrap();
        assert_eq!(event.key, "charge.create");
    }

    #[test]
    fn test_construct_event_rejects_non_event() {
        let v = verifier();
        let header = v.sign(b"[1,2]", Utc::now().timestamp());
        assert!(matches!(v.construct_event(b"[1,2]", &header), Err(PaygateError::Decode(_))));
    }

    proptest! {
        #[test]
        fn prop_signed_payload_verifies(payload in proptest::collection::vec(any::<u8>(), 0..512), ts in 0i64..4_000_000_000) {
            let v = verifier();
            let header = v.sign(&payload, ts);
            prop_assert!(v.verify(&payload, &header, ts).is_ok());
        }

        #[test]
        fn prop_modified_payload_fails(
            payload in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
        ) {
            let v = verifier();
            let header = v.sign(&payload, NOW);
            let mut tampered = payload.clone();
            let i = index.index(tampered.len());
            tampered[i] ^= 0x01;
            prop_assert!(v.verify(&tampered, &header, NOW).is_err());
        }
    }
}
