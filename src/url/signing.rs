//! URL signing
//!
//! ImageKit signed URLs carry `ik-s`, a lowercase hex HMAC-SHA1 computed as:
//! ```text
//! ik-s = hex(HMAC-SHA1(private_key, canonical_url + expiry))
//! ```
//! where `canonical_url` is the unsigned URL with the endpoint prefix removed.

use std::fmt;

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Expiry fed to the signer when the URL never expires (`ik-t` is omitted)
pub const DEFAULT_EXPIRY: u64 = 9_999_999_999;

/// Signing primitive used by the URL builder
pub trait UrlSigner: Send + Sync + fmt::Debug {
    /// Compute the `ik-s` value for a canonical URL and expiry timestamp
    fn sign(&self, canonical: &str, expiry: u64) -> String;

    /// Check a signature produced by [`UrlSigner::sign`]
    fn verify(&self, canonical: &str, expiry: u64, signature: &str) -> bool {
        constant_time_compare(&self.sign(canonical, expiry), signature)
    }
}

/// Default signer keyed by the account's private key
#[derive(Clone)]
pub struct HmacSha1Signer {
    private_key: Vec<u8>,
}

impl HmacSha1Signer {
    pub fn new(private_key: impl Into<Vec<u8>>) -> Self {
        Self {
            private_key: private_key.into(),
        }
    }
}

impl fmt::Debug for HmacSha1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSha1Signer")
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl UrlSigner for HmacSha1Signer {
    fn sign(&self, canonical: &str, expiry: u64) -> String {
        let mut mac =
            HmacSha1::new_from_slice(&self.private_key).expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        mac.update(expiry.to_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
