//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: an in-memory escrow agent with
//! a deterministic key provider, and a client-side request signer that
//! builds valid signed bundles the way a controller's application would.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use std::collections::BTreeMap;

use keyward::bundle::{
    PARAM_CLIENT_ID, PARAM_NONCE, PARAM_REQUEST_TOKEN, PARAM_TIMESTAMP,
};
use keyward::{EscrowKernel, KernelConfig, KeyProvider, KeyProviderError, SignedRequest};
use keyward_core::{
    crypto, now_millis, ApplicationId, ClientCredentials, ClientId, ControllerId,
    EncryptionKey, Secret, SubjectId, TokenId, UnixMillis,
};
use keyward_policy::DataType;
use keyward_store::MemoryStore;

/// Endpoint URLs used by the fixtures. Arbitrary but stable, so signatures
/// computed in different tests agree.
pub const TOKEN_URL: &str = "https://agent.test/token";
pub const AUTHORIZE_URL: &str = "https://agent.test/authorize";
pub const EXCHANGE_URL: &str = "https://agent.test/exchange";

/// A key provider that derives a deterministic key per scope.
///
/// The key is a MAC over the scope string, so distinct scopes get distinct
/// keys and repeated requests get identical ones.
pub struct DerivedKeyProvider;

#[async_trait]
impl KeyProvider for DerivedKeyProvider {
    async fn request_key(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
    ) -> Result<EncryptionKey, KeyProviderError> {
        let scope = format!("{}|{}|{}", subject, controller, data_type.as_str());
        let hex = crypto::sign(&scope, "testkit-provider&");
        EncryptionKey::from_hex(&hex).map_err(|e| KeyProviderError(e.to_string()))
    }
}

/// A key provider that always fails, for error-path tests.
pub struct FailingKeyProvider;

#[async_trait]
impl KeyProvider for FailingKeyProvider {
    async fn request_key(
        &self,
        _subject: &SubjectId,
        _controller: &ControllerId,
        _data_type: DataType,
    ) -> Result<EncryptionKey, KeyProviderError> {
        Err(KeyProviderError("escrow vault unavailable".to_owned()))
    }
}

/// An in-memory escrow agent with a deterministic key provider.
pub struct TestAgent {
    pub kernel: EscrowKernel<MemoryStore>,
}

impl TestAgent {
    /// Create an agent with the default configuration.
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            kernel: EscrowKernel::new(MemoryStore::new(), Arc::new(DerivedKeyProvider), config),
        }
    }

    pub fn with_provider(provider: Arc<dyn KeyProvider>) -> Self {
        Self {
            kernel: EscrowKernel::new(MemoryStore::new(), provider, KernelConfig::default()),
        }
    }

    /// Register a client and return a signer holding its credentials.
    pub async fn register(
        &self,
        subject: &str,
        controller: &str,
        application: &str,
    ) -> RequestSigner {
        let credentials = self
            .kernel
            .register_client(
                SubjectId::new(subject),
                ControllerId::new(controller),
                ApplicationId::new(application),
            )
            .await
            .expect("registration");
        RequestSigner::new(credentials)
    }
}

impl Default for TestAgent {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-side request construction: what the controller's application
/// does before sending a request to the agent.
pub struct RequestSigner {
    pub client_id: ClientId,
    pub client_secret: Secret,
    counter: AtomicU64,
}

impl RequestSigner {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            counter: AtomicU64::new(0),
        }
    }

    /// A nonce unique within this signer.
    pub fn next_nonce(&self) -> String {
        format!(
            "{}-{}",
            self.client_id,
            self.counter.fetch_add(1, Ordering::Relaxed)
        )
    }

    /// Sign a request timestamped now.
    pub fn sign(
        &self,
        url: &str,
        token: Option<(&TokenId, &Secret)>,
        extra: &[(&str, &str)],
    ) -> SignedRequest {
        self.sign_at(url, token, extra, now_millis(), &self.next_nonce())
    }

    /// Sign a request with an explicit timestamp and nonce.
    pub fn sign_at(
        &self,
        url: &str,
        token: Option<(&TokenId, &Secret)>,
        extra: &[(&str, &str)],
        timestamp: UnixMillis,
        nonce: &str,
    ) -> SignedRequest {
        let mut params = BTreeMap::new();
        params.insert(PARAM_CLIENT_ID.to_owned(), self.client_id.to_string());
        params.insert(PARAM_NONCE.to_owned(), nonce.to_owned());
        params.insert(PARAM_TIMESTAMP.to_owned(), timestamp.to_string());
        if let Some((token_id, _)) = token {
            params.insert(PARAM_REQUEST_TOKEN.to_owned(), token_id.to_string());
        }
        for (key, value) in extra {
            params.insert((*key).to_owned(), (*value).to_owned());
        }

        let mut request = SignedRequest {
            method: "POST".into(),
            url: url.to_owned(),
            params,
            signature: String::new(),
        };
        let key =
            crypto::signing_key_for(&self.client_secret, token.map(|(_, secret)| secret));
        request.signature = crypto::sign(&request.base_string(), &key);
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_issue_roundtrip() {
        let agent = TestAgent::new();
        let signer = agent.register("alice", "shop", "crm").await;
        let request = signer.sign(TOKEN_URL, None, &[]);
        let reply = agent.kernel.issue_token(&request).await.unwrap();
        assert!(!reply.token_secret.as_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_derived_provider_deterministic() {
        let provider = DerivedKeyProvider;
        let a = provider
            .request_key(
                &SubjectId::new("alice"),
                &ControllerId::new("shop"),
                DataType::Identity,
            )
            .await
            .unwrap();
        let b = provider
            .request_key(
                &SubjectId::new("alice"),
                &ControllerId::new("shop"),
                DataType::Identity,
            )
            .await
            .unwrap();
        let other = provider
            .request_key(
                &SubjectId::new("bob"),
                &ControllerId::new("shop"),
                DataType::Identity,
            )
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, other);
    }

    #[tokio::test]
    async fn test_nonces_unique_per_signer() {
        let agent = TestAgent::new();
        let signer = agent.register("alice", "shop", "crm").await;
        assert_ne!(signer.next_nonce(), signer.next_nonce());
    }
}
