//! Credential generation: unique ids and random secrets.
//!
//! No persistence or uniqueness checking here; callers commit new clients
//! and tokens through the store, whose unique constraints are the actual
//! guarantee against the (vanishingly unlikely) id collision.

use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::types::Secret;

/// Secret length in bytes: the HMAC-SHA1 key size.
pub const SECRET_LEN: usize = 20;

/// A fresh identifier, unique with overwhelming probability.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fresh cryptographically random key material.
pub fn new_secret() -> Secret {
    let mut bytes = [0u8; SECRET_LEN];
    OsRng.fill_bytes(&mut bytes);
    Secret::from_bytes(bytes.to_vec())
}
