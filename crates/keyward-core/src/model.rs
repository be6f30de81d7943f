//! Protocol entities: Client, RequestToken, Nonce, EncryptionKey.
//!
//! These are the three pieces of shared mutable state the protocol touches
//! (plus the key that a successful exchange releases). Persistence lives
//! behind the store trait; the entities themselves are plain data.

use serde::{Deserialize, Serialize};

use crate::types::{
    ApplicationId, ClientId, ControllerId, Secret, SubjectId, TokenId, UnixMillis,
};

/// One registered (subject, controller, application) identity.
///
/// At most one client may exist per triple; the store enforces this with a
/// unique constraint. Clients are immutable after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier.
    pub id: ClientId,

    /// HMAC key material shared with the controller's application.
    pub secret: Secret,

    /// The data subject the client acts about.
    pub subject: SubjectId,

    /// The data controller the client acts for.
    pub controller: ControllerId,

    /// The authorized application presenting requests.
    pub application: ApplicationId,
}

/// Default request-token validity: one day.
pub const TOKEN_VALIDITY_MS: i64 = 24 * 60 * 60 * 1000;

/// A short-lived credential exchanged, once authorized, for an encryption key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestToken {
    /// Unique token identifier.
    pub id: TokenId,

    /// Token secret, appended to the client secret in the signing key.
    pub secret: Secret,

    /// The client this token was minted for.
    pub client_id: ClientId,

    /// Start of the validity window (Unix ms).
    pub valid_from: UnixMillis,

    /// End of the validity window (Unix ms).
    pub valid_to: UnixMillis,

    /// Set once the policy evaluator allows the requested use.
    pub authorized: bool,

    /// Set when the token is exchanged for a key. Never cleared.
    pub used: bool,
}

impl RequestToken {
    /// Mint a token valid for [`TOKEN_VALIDITY_MS`] from `now`.
    pub fn new(id: TokenId, secret: Secret, client_id: ClientId, now: UnixMillis) -> Self {
        Self {
            id,
            secret,
            client_id,
            valid_from: now,
            valid_to: now + TOKEN_VALIDITY_MS,
            authorized: false,
            used: false,
        }
    }

    /// True while `now` is inside the validity window and the token is unused.
    pub fn is_valid(&self, now: UnixMillis) -> bool {
        !self.used && now >= self.valid_from && now <= self.valid_to
    }

    /// True iff the token may be exchanged for an encryption key.
    pub fn is_exchangeable(&self, now: UnixMillis) -> bool {
        self.is_valid(now) && self.authorized
    }
}

/// A one-time value recorded per client to detect replayed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce {
    /// The client that presented this nonce.
    pub client_id: ClientId,

    /// The nonce value itself.
    pub value: String,

    /// The request timestamp it arrived with (Unix ms).
    pub timestamp: UnixMillis,
}

/// An encryption/decryption key released by the key provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionKey(Vec<u8>);

impl EncryptionKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode(s)?))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Transport form: lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptionKey({} bytes)", self.0.len())
    }
}
