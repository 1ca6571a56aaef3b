use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Verifies webhook authenticity against the shared signing secret.
///
/// The signature header has the form `t=<unix-ts>,v1=<hex-hmac>` where the
/// MAC is HMAC-SHA256 over `"{t}.{raw-body}"`. Verification must complete
/// before any other side effect of event processing.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Check the signature header against the raw payload. Returns an
    /// authentication error on any malformed header or MAC mismatch.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> AppResult<()> {
        let (timestamp, signature_hex) = parse_signature_header(signature_header)?;

        let signature = hex::decode(signature_hex).map_err(|_| {
            AppError::Authentication("Signature is not valid hex".to_string())
        })?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AppError::Authentication("Invalid signing secret".to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        // verify_slice is constant-time
        mac.verify_slice(&signature).map_err(|_| {
            warn!("Webhook signature mismatch");
            AppError::Authentication("Webhook signature mismatch".to_string())
        })
    }

    /// Produce a signature header for a payload. Counterpart of `verify`,
    /// used by event-source simulations in tests.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("any key length works");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let digest = mac.finalize().into_bytes();
        format!("t={},v1={}", timestamp, hex::encode(digest))
    }
}

fn parse_signature_header(header: &str) -> AppResult<(&str, &str)> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(v1)) => Ok((t, v1)),
        _ => Err(AppError::Authentication(
            "Malformed signature header".to_string(),
        )),
    }
}
