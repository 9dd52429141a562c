//! HMAC-SHA256 webhook signature verification.
//!
//! The source host signs the exact request body bytes and sends the result as
//! `sha256=<lowercase hex>`. Verification must run on those raw bytes: a JSON
//! re-encoding is not guaranteed to be byte-identical.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of every signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// The shared webhook secret.
///
/// `Debug` is redacted so the secret cannot reach logs through formatting.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    /// Wraps a secret. Returns `None` for an empty secret, which would make
    /// every signature trivially forgeable.
    pub fn new(secret: impl Into<Vec<u8>>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

/// Computes the `sha256=<hex>` signature of `body` under `secret`.
pub fn sign(body: &[u8], secret: &[u8]) -> String {
    // HMAC accepts keys of any length; `new_from_slice` cannot fail here.
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC key of any length");
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Returns `true` if `provided` is exactly the signature of `body` under `secret`.
///
/// The comparison is constant-time over the full header value. Malformed or
/// empty values simply fail; this function never panics or errors.
pub fn verify(body: &[u8], secret: &[u8], provided: &str) -> bool {
    if !provided.starts_with(SIGNATURE_PREFIX) {
        return false;
    }
    let expected = sign(body, secret);
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
