//! Bearer-token check for webhook deliveries.

use axum::http::HeaderValue;
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

/// Expected `Authorization` header for webhook deliveries.
///
/// Only a SHA-256 digest of `Bearer <secret>` is kept. Incoming headers are
/// hashed and compared digest to digest in constant time.
#[derive(Clone)]
pub struct WebhookAuth {
    expected: [u8; 32],
}

impl WebhookAuth {
    pub fn new(secret: &str) -> Self {
        Self {
            expected: digest(format!("Bearer {secret}").as_bytes()),
        }
    }

    /// Check an `Authorization` header value. A missing header never passes.
    pub fn verify(&self, header: Option<&HeaderValue>) -> bool {
        let Some(value) = header else {
            return false;
        };
        let actual = digest(value.as_bytes());
        bool::from(actual.as_slice().ct_eq(self.expected.as_slice()))
    }
}

impl fmt::Debug for WebhookAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookAuth(<redacted>)")
    }
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}
