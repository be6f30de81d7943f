//! # Keyward Core
//!
//! Core primitives for the Keyward escrow-agent protocol engine:
//!
//! - **Typed identifiers** for clients, tokens, subjects, controllers and
//!   applications, plus redacting `Secret` key material
//! - **Entities**: `Client`, `RequestToken` (with its validity window),
//!   `Nonce`, `EncryptionKey`
//! - **Canonical request encoding**: the deterministic signature base
//!   string both ends of the protocol hash
//! - **Signing**: HMAC-SHA1 over the canonical string, constant-time
//!   verification
//! - **Credentials**: UUID ids and random secrets
//! - **Wire forms**: URL-encoded reply messages with explicit field lists
//!
//! Nothing in this crate does I/O; persistence and orchestration live in
//! `keyward-store` and `keyward`.

pub mod canonical;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod model;
pub mod types;
pub mod wire;

pub use canonical::{normalize_base_url, normalize_parameters, percent_encode, signature_base};
pub use error::CoreError;
pub use model::{Client, EncryptionKey, Nonce, RequestToken, TOKEN_VALIDITY_MS};
pub use types::{
    now_millis, ApplicationId, ClientId, ControllerId, Secret, SubjectId, TokenId, UnixMillis,
};
pub use wire::{ClientCredentials, KeyReply, TokenReply};
