//! Signed-request authentication.
//!
//! Checks run cheapest-first and every failure carries a distinct reason:
//! timestamp freshness, then a non-recording nonce lookup, then signature
//! verification, and only then the atomic nonce insert. The ordering is a
//! hard requirement in one respect: a request that fails verification must
//! never record its nonce, or an attacker could burn nonces for a
//! legitimate client with garbage signatures.
//!
//! The insert can still report a duplicate when two copies of one request
//! race past the lookup together; that duplicate is the same replay
//! failure, just detected late.

use keyward_core::{crypto, Client, Nonce, Secret, UnixMillis};
use keyward_store::{NonceInsert, Store};

use crate::bundle::SignedRequest;
use crate::error::{KernelError, Result, UnverifiedReason};
use crate::replay::ReplayGuard;

/// Resolve the client a request claims to come from.
pub async fn resolve_client<S: Store>(store: &S, request: &SignedRequest) -> Result<Client> {
    let client_id = request.client_id()?;
    match store.get_client(&client_id).await? {
        Some(client) => Ok(client),
        None => {
            tracing::warn!(client = %client_id, "request from unknown client");
            Err(KernelError::Unverified(UnverifiedReason::UnknownClient))
        }
    }
}

/// Authenticate a signed request for an already-resolved client.
///
/// `token_secret` is the second half of the signing key once a request
/// token exists; `None` for token-generation requests.
pub async fn validate_request<S: Store>(
    store: &S,
    guard: &ReplayGuard,
    client: &Client,
    token_secret: Option<&Secret>,
    request: &SignedRequest,
    now: UnixMillis,
) -> Result<()> {
    let timestamp = request.timestamp()?;
    if !guard.is_fresh(timestamp, now) {
        tracing::warn!(client = %client.id, timestamp, now, "request timestamp out of window");
        return Err(KernelError::Unverified(UnverifiedReason::StaleTimestamp));
    }

    let nonce = request.nonce()?;
    if store.nonce_exists(&client.id, nonce).await? {
        tracing::warn!(client = %client.id, nonce, "replayed nonce");
        return Err(KernelError::Unverified(UnverifiedReason::ReplayedNonce));
    }

    let key = crypto::signing_key_for(&client.secret, token_secret);
    if crypto::verify(&request.signature, &request.base_string(), &key).is_err() {
        tracing::warn!(client = %client.id, "signature verification failed");
        return Err(KernelError::Unverified(UnverifiedReason::BadSignature));
    }

    let record = Nonce {
        client_id: client.id.clone(),
        value: nonce.to_owned(),
        timestamp,
    };
    match store.insert_nonce(&record).await? {
        NonceInsert::Inserted => Ok(()),
        NonceInsert::Duplicate => {
            tracing::warn!(client = %client.id, nonce, "nonce raced to a duplicate");
            Err(KernelError::Unverified(UnverifiedReason::ReplayedNonce))
        }
    }
}
