//! Request signing and verification.
//!
//! Requests are signed with HMAC-SHA1 over the UTF-8 bytes of the canonical
//! signature base string, hex-encoded for transport. The signing key is the
//! concatenation of the client secret and, once a token exists, the token
//! secret, joined with `&`. For token-generation requests no token exists
//! yet, so the key ends in a bare `&`.
//!
//! Signing is purely functional. Verification recomputes the MAC and
//! compares in constant time; it must never branch on secret content in a
//! timing-observable way.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::CoreError;
use crate::types::Secret;

type HmacSha1 = Hmac<Sha1>;

/// Build the signing key string from the transport (hex) secret forms.
///
/// `token_secret` is `None` for requests made before a token exists.
pub fn signing_key(client_secret: &str, token_secret: Option<&str>) -> String {
    format!("{}&{}", client_secret, token_secret.unwrap_or(""))
}

/// Convenience: build the signing key from stored secrets.
pub fn signing_key_for(client: &Secret, token: Option<&Secret>) -> String {
    let token_hex = token.map(Secret::to_hex);
    signing_key(&client.to_hex(), token_hex.as_deref())
}

fn mac_for(key: &str) -> HmacSha1 {
    // HMAC accepts keys of any length, so this cannot fail.
    HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length")
}

/// Sign a canonical base string, returning the hex-encoded MAC.
pub fn sign(base: &str, key: &str) -> String {
    let mut mac = mac_for(key);
    mac.update(base.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a candidate hex signature against the recomputed MAC.
///
/// The comparison runs in constant time. A malformed candidate (non-hex)
/// is distinguished from a plain mismatch only in the error payload; both
/// are hard failures.
pub fn verify(candidate: &str, base: &str, key: &str) -> Result<(), CoreError> {
    let bytes = hex::decode(candidate)
        .map_err(|_| CoreError::MalformedSignature(candidate.len()))?;
    let mut mac = mac_for(key);
    mac.update(base.as_bytes());
    mac.verify_slice(&bytes).map_err(|_| CoreError::InvalidSignature)
}
