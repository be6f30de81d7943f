//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite but
//! keeps everything in memory with no persistence. The single RwLock makes
//! every operation atomic, which trivially satisfies the nonce and
//! token-take atomicity requirements.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use keyward_core::{
    ApplicationId, Client, ClientId, ControllerId, Nonce, RequestToken, SubjectId, TokenId,
    UnixMillis,
};
use keyward_policy::{AuthorizationEvent, AuthorizationRule, DataType};

use crate::error::Result;
use crate::traits::{ClientInsert, NonceInsert, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Clients by id.
    clients: HashMap<ClientId, Client>,

    /// Registration uniqueness index: triple -> client id.
    triples: HashMap<(SubjectId, ControllerId, ApplicationId), ClientId>,

    /// Request tokens by id.
    tokens: HashMap<TokenId, RequestToken>,

    /// Accepted nonces: (client, value) -> request timestamp.
    nonces: HashMap<(ClientId, String), UnixMillis>,

    /// Authorization rules by exact triple.
    rules: HashMap<(SubjectId, ControllerId, DataType), AuthorizationRule>,

    /// Append-only decision log.
    decisions: Vec<AuthorizationEvent>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_client(&self, client: &Client) -> Result<ClientInsert> {
        let mut inner = self.inner.write().unwrap();

        let triple = (
            client.subject.clone(),
            client.controller.clone(),
            client.application.clone(),
        );
        if inner.triples.contains_key(&triple) {
            return Ok(ClientInsert::DuplicateTriple);
        }

        inner.triples.insert(triple, client.id.clone());
        inner.clients.insert(client.id.clone(), client.clone());
        Ok(ClientInsert::Inserted)
    }

    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.clients.get(id).cloned())
    }

    async fn insert_token(&self, token: &RequestToken) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.tokens.insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn get_token(
        &self,
        id: &TokenId,
        client_id: &ClientId,
    ) -> Result<Option<RequestToken>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .tokens
            .get(id)
            .filter(|t| &t.client_id == client_id)
            .cloned())
    }

    async fn set_token_authorized(&self, id: &TokenId) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if let Some(token) = inner.tokens.get_mut(id) {
            token.authorized = true;
        }
        Ok(())
    }

    async fn take_token(
        &self,
        id: &TokenId,
        client_id: &ClientId,
    ) -> Result<Option<RequestToken>> {
        let mut inner = self.inner.write().unwrap();
        match inner.tokens.get(id) {
            Some(token) if &token.client_id == client_id => Ok(inner.tokens.remove(id)),
            _ => Ok(None),
        }
    }

    async fn insert_nonce(&self, nonce: &Nonce) -> Result<NonceInsert> {
        let mut inner = self.inner.write().unwrap();
        let key = (nonce.client_id.clone(), nonce.value.clone());
        if inner.nonces.contains_key(&key) {
            return Ok(NonceInsert::Duplicate);
        }
        inner.nonces.insert(key, nonce.timestamp);
        Ok(NonceInsert::Inserted)
    }

    async fn nonce_exists(&self, client_id: &ClientId, value: &str) -> Result<bool> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .nonces
            .contains_key(&(client_id.clone(), value.to_owned())))
    }

    async fn prune_nonces(&self, before: UnixMillis) -> Result<u64> {
        let mut inner = self.inner.write().unwrap();
        let before_len = inner.nonces.len();
        inner.nonces.retain(|_, &mut ts| ts >= before);
        Ok((before_len - inner.nonces.len()) as u64)
    }

    async fn get_rule(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
    ) -> Result<Option<AuthorizationRule>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .rules
            .get(&(subject.clone(), controller.clone(), data_type))
            .cloned())
    }

    async fn upsert_rule(&self, rule: &AuthorizationRule) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.rules.insert(
            (rule.subject.clone(), rule.controller.clone(), rule.data_type),
            rule.clone(),
        );
        Ok(())
    }

    async fn append_decision(&self, event: &AuthorizationEvent) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.decisions.push(event.clone());
        Ok(())
    }

    async fn decisions_for(&self, subject: &SubjectId) -> Result<Vec<AuthorizationEvent>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .decisions
            .iter()
            .filter(|e| &e.subject == subject)
            .cloned()
            .collect())
    }
}
