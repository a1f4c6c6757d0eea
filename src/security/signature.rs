//! HMAC request signing and replay-window verification.
//!
//! Signed callers send `X-Timestamp` (epoch seconds) and `X-Signature`
//! (lowercase hex `HMAC-SHA256(secret, timestamp + "." + body)`). Unsigned
//! requests pass unless signing is configured as mandatory.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::SigningConfig;
use crate::error::ApiError;

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex signature for `timestamp` and `body`.
pub fn sign(secret: &[u8], timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Current wall-clock time in epoch seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Verifies request signatures against the shared signing secret.
pub struct SignatureVerifier {
    secret: Vec<u8>,
    freshness_secs: u64,
    required: bool,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>, config: &SigningConfig) -> Self {
        Self {
            secret: secret.into(),
            freshness_secs: config.freshness_secs,
            required: config.required,
        }
    }

    pub fn verify(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<(), ApiError> {
        self.verify_at(signature, timestamp, body, unix_now())
    }

    pub fn verify_at(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), ApiError> {
        let Some(signature) = signature else {
            return if self.required {
                Err(ApiError::SignatureRequired)
            } else {
                Ok(())
            };
        };

        let raw_timestamp = timestamp.unwrap_or_default().trim();
        let ts: i64 = raw_timestamp.parse().map_err(|_| {
            ApiError::BadRequest(format!("{TIMESTAMP_HEADER} must be integer epoch seconds"))
        })?;

        let skew = now.abs_diff(ts);
        if skew > self.freshness_secs {
            return Err(ApiError::StaleRequest { skew_secs: skew });
        }

        // An empty key would let anyone mint signatures.
        if self.secret.is_empty() {
            return Err(ApiError::IntegrityFailure);
        }

        let expected = sign(&self.secret, raw_timestamp, body);
        if bool::from(expected.as_bytes().ct_eq(signature.trim().as_bytes())) {
            Ok(())
        } else {
            Err(ApiError::IntegrityFailure)
        }
    }
}
