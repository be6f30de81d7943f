//! Store trait: the abstract interface for protocol-state persistence.
//!
//! The protocol keeps three pieces of shared mutable state (clients and
//! request tokens, nonces, and authorization rules) plus the append-only
//! audit log. This trait lets the kernel stay storage-agnostic;
//! implementations are SQLite (primary) and in-memory (for tests).
//!
//! Two operations carry the protocol's atomicity requirements and MUST be
//! atomic in every implementation:
//!
//! - [`insert_nonce`](Store::insert_nonce): check-and-record in one step,
//!   so two concurrent identical requests cannot both pass replay
//!   detection.
//! - [`take_token`](Store::take_token): fetch-and-delete in one step, so
//!   two concurrent exchange attempts against one token produce exactly
//!   one winner.

use async_trait::async_trait;

use keyward_core::{
    Client, ClientId, ControllerId, Nonce, RequestToken, SubjectId, TokenId, UnixMillis,
};
use keyward_policy::{AuthorizationEvent, AuthorizationRule, DataType};

use crate::error::Result;

/// Result of inserting a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientInsert {
    /// Client was inserted.
    Inserted,
    /// A client already exists for this (subject, controller, application)
    /// triple. Caught by a storage-level unique constraint, not a
    /// pre-check, so concurrent duplicate registrations cannot both land.
    DuplicateTriple,
}

/// Result of recording a nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceInsert {
    /// First sighting; the nonce is now recorded.
    Inserted,
    /// This client already used this nonce value.
    Duplicate,
}

/// Async interface for protocol-state persistence.
#[async_trait]
pub trait Store: Send + Sync {
    // Clients

    /// Insert a newly registered client.
    async fn insert_client(&self, client: &Client) -> Result<ClientInsert>;

    /// Look up a client by id.
    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>>;

    // Request tokens

    /// Store a freshly minted token.
    async fn insert_token(&self, token: &RequestToken) -> Result<()>;

    /// Look up a token by (token id, owning client id).
    async fn get_token(&self, id: &TokenId, client_id: &ClientId)
        -> Result<Option<RequestToken>>;

    /// Flip a token's `authorized` flag.
    async fn set_token_authorized(&self, id: &TokenId) -> Result<()>;

    /// Atomically remove and return a token. At most one concurrent caller
    /// receives `Some`.
    async fn take_token(&self, id: &TokenId, client_id: &ClientId)
        -> Result<Option<RequestToken>>;

    // Nonces

    /// Atomically record a nonce unless this client already used the value.
    async fn insert_nonce(&self, nonce: &Nonce) -> Result<NonceInsert>;

    /// Non-recording existence check, used for early diagnostics.
    async fn nonce_exists(&self, client_id: &ClientId, value: &str) -> Result<bool>;

    /// Drop nonces whose request timestamp is older than `before`.
    /// Returns the number removed.
    async fn prune_nonces(&self, before: UnixMillis) -> Result<u64>;

    // Authorization rules

    /// Fetch the rule for an exact (subject, controller, data type) triple.
    async fn get_rule(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
    ) -> Result<Option<AuthorizationRule>>;

    /// Insert or replace a rule.
    async fn upsert_rule(&self, rule: &AuthorizationRule) -> Result<()>;

    // Audit log

    /// Append a decision to the audit log. Append-only; never updated.
    async fn append_decision(&self, event: &AuthorizationEvent) -> Result<()>;

    /// All recorded decisions about a subject, oldest first.
    async fn decisions_for(&self, subject: &SubjectId) -> Result<Vec<AuthorizationEvent>>;
}
