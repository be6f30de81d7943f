//! The escrow kernel: unified API for the Keyward protocol.
//!
//! The kernel ties together the validator, the replay guard, the token
//! lifecycle, the policy evaluator, the key provider, and the audit log
//! behind one set of operations:
//!
//! - `register_client` mints credentials for a (subject, controller,
//!   application) triple
//! - `issue_token` turns a signed request into an unauthorized token
//! - `authorize_token` evaluates policy and, on an allowed decision,
//!   marks the token exchangeable
//! - `exchange_key` burns the token and releases the encryption key
//! - rule management edits a subject's allowances
//!
//! Every signed operation authenticates the request before touching any
//! state it would mutate.

use std::sync::Arc;

use keyward_core::{
    credentials, now_millis, ApplicationId, Client, ClientCredentials, ClientId, ControllerId,
    KeyReply, RequestToken, SubjectId, TokenId, TokenReply, UnixMillis,
};
use keyward_policy::{
    evaluate, AuthorizationEvent, AuthorizationRule, DataProvenance, DataType, DataUse,
    Evaluation,
};
use keyward_store::{ClientInsert, Store};

use crate::bundle::SignedRequest;
use crate::error::{KernelError, Result};
use crate::provider::KeyProvider;
use crate::replay::{ReplayGuard, DEFAULT_TIMESTAMP_TOLERANCE_MS};
use crate::validator::{resolve_client, validate_request};

/// Configuration for the kernel.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Accepted clock skew for signed requests, both directions.
    pub timestamp_tolerance_ms: i64,
    /// Lifetime of a freshly minted request token.
    pub token_validity_ms: i64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            timestamp_tolerance_ms: DEFAULT_TIMESTAMP_TOLERANCE_MS,
            token_validity_ms: keyward_core::TOKEN_VALIDITY_MS,
        }
    }
}

/// The main kernel struct.
pub struct EscrowKernel<S: Store> {
    store: Arc<S>,
    provider: Arc<dyn KeyProvider>,
    guard: ReplayGuard,
    config: KernelConfig,
}

impl<S: Store> EscrowKernel<S> {
    /// Create a kernel over a store and a key provider.
    pub fn new(store: S, provider: Arc<dyn KeyProvider>, config: KernelConfig) -> Self {
        let guard = ReplayGuard::new(config.timestamp_tolerance_ms);
        Self {
            store: Arc::new(store),
            provider,
            guard,
            config,
        }
    }

    /// Create a kernel with the default configuration.
    pub fn with_defaults(store: S, provider: Arc<dyn KeyProvider>) -> Self {
        Self::new(store, provider, KernelConfig::default())
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // Registration

    /// Register a client for a (subject, controller, application) triple
    /// and return its fresh credentials.
    ///
    /// At most one client may exist per triple; a duplicate registration
    /// fails without disturbing the existing credentials.
    pub async fn register_client(
        &self,
        subject: SubjectId,
        controller: ControllerId,
        application: ApplicationId,
    ) -> Result<ClientCredentials> {
        let client = Client {
            id: ClientId::new(credentials::new_id()),
            secret: credentials::new_secret(),
            subject,
            controller,
            application,
        };

        match self.store.insert_client(&client).await? {
            ClientInsert::Inserted => {
                tracing::info!(client = %client.id, subject = %client.subject, "client registered");
                Ok(ClientCredentials {
                    client_id: client.id,
                    client_secret: client.secret,
                })
            }
            ClientInsert::DuplicateTriple => {
                tracing::warn!(subject = %client.subject, controller = %client.controller,
                    "duplicate client registration");
                Err(KernelError::RegistrationFailed)
            }
        }
    }

    // Token lifecycle

    /// Mint an unauthorized request token for a verified signed request.
    ///
    /// The request signs under the client secret alone; no token secret
    /// exists yet.
    pub async fn issue_token(&self, request: &SignedRequest) -> Result<TokenReply> {
        let now = now_millis();
        let client = resolve_client(self.store.as_ref(), request).await?;
        validate_request(self.store.as_ref(), &self.guard, &client, None, request, now).await?;

        let mut token = RequestToken::new(
            TokenId::new(credentials::new_id()),
            credentials::new_secret(),
            client.id.clone(),
            now,
        );
        token.valid_to = token.valid_from + self.config.token_validity_ms;
        self.store.insert_token(&token).await?;

        tracing::info!(client = %client.id, token = %token.id, "request token issued");
        Ok(TokenReply {
            request_token: token.id,
            token_secret: token.secret,
        })
    }

    /// Evaluate policy for a signed request and, if allowed, mark its
    /// token exchangeable.
    ///
    /// Every evaluation lands in the audit log, allowed or not. A denial
    /// leaves the token unauthorized but intact: the subject may still
    /// grant the allowance and let the client retry before the token
    /// expires.
    pub async fn authorize_token(&self, request: &SignedRequest) -> Result<Evaluation> {
        let now = now_millis();
        let client = resolve_client(self.store.as_ref(), request).await?;
        let token = self.require_token(request, &client).await?;
        validate_request(
            self.store.as_ref(),
            &self.guard,
            &client,
            Some(&token.secret),
            request,
            now,
        )
        .await?;

        if !token.is_valid(now) {
            tracing::warn!(token = %token.id, "authorization attempt on invalid token");
            return Err(KernelError::InvalidRequestToken);
        }

        let data_type = request.data_type()?;
        let kind = request.request_kind()?;
        let rule = self
            .store
            .get_rule(&client.subject, &client.controller, data_type)
            .await?;
        let evaluation = evaluate(rule.as_ref(), data_type, kind, now);

        self.store
            .append_decision(&AuthorizationEvent {
                subject: client.subject.clone(),
                controller: client.controller.clone(),
                application: client.application.clone(),
                data_type,
                request: kind,
                decision: evaluation.decision,
                process: evaluation.process,
                timestamp: now,
            })
            .await?;

        if evaluation.decision.is_allowed() {
            self.store.set_token_authorized(&token.id).await?;
            tracing::info!(token = %token.id, ?data_type, "request token authorized");
            Ok(evaluation)
        } else {
            tracing::warn!(token = %token.id, ?data_type, decision = ?evaluation.decision,
                "access denied");
            Err(KernelError::AccessDenied(evaluation.decision))
        }
    }

    /// Exchange an authorized token for the encryption key it was minted
    /// toward. The token is consumed either way.
    ///
    /// The take is atomic in the store, so concurrent exchanges of one
    /// token produce exactly one winner. A token that turns out to be
    /// unauthorized, expired, or already used is gone by the time the
    /// error is returned.
    pub async fn exchange_key(&self, request: &SignedRequest) -> Result<KeyReply> {
        let now = now_millis();
        let client = resolve_client(self.store.as_ref(), request).await?;
        let token = self.require_token(request, &client).await?;
        validate_request(
            self.store.as_ref(),
            &self.guard,
            &client,
            Some(&token.secret),
            request,
            now,
        )
        .await?;

        // Re-fetch atomically; the copy used for signature verification
        // may have lost a race since.
        let token = match self.store.take_token(&token.id, &client.id).await? {
            Some(token) => token,
            None => return Err(KernelError::InvalidRequestToken),
        };

        if !token.is_exchangeable(now) {
            tracing::warn!(token = %token.id, authorized = token.authorized,
                "exchange attempt on non-exchangeable token; token burned");
            return Err(KernelError::InvalidRequestToken);
        }

        let data_type = request.data_type()?;
        let key = self
            .provider
            .request_key(&client.subject, &client.controller, data_type)
            .await?;

        tracing::info!(client = %client.id, token = %token.id, ?data_type,
            "encryption key released");
        Ok(KeyReply {
            encryption_key: key,
        })
    }

    async fn require_token(
        &self,
        request: &SignedRequest,
        client: &Client,
    ) -> Result<RequestToken> {
        let token_id = request.token_id()?;
        self.store
            .get_token(&token_id, &client.id)
            .await?
            .ok_or(KernelError::InvalidRequestToken)
    }

    // Rule management (subject-side; not signed protocol requests)

    /// Grant a use allowance, replacing any previous window for the same use.
    pub async fn allow_use(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
        data_use: DataUse,
        valid_from: UnixMillis,
        valid_to: Option<UnixMillis>,
    ) -> Result<()> {
        self.edit_rule(subject, controller, data_type, |rule| {
            rule.allow_use(data_use, valid_from, valid_to)
        })
        .await
    }

    /// Grant a provenance allowance.
    pub async fn allow_provenance(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
        provenance: DataProvenance,
        valid_from: UnixMillis,
        valid_to: Option<UnixMillis>,
    ) -> Result<()> {
        self.edit_rule(subject, controller, data_type, |rule| {
            rule.allow_provenance(provenance, valid_from, valid_to)
        })
        .await
    }

    /// Withdraw a single use allowance.
    pub async fn revoke_use(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
        data_use: DataUse,
    ) -> Result<()> {
        self.edit_rule(subject, controller, data_type, |rule| {
            rule.revoke_use(data_use)
        })
        .await
    }

    /// Withdraw a single provenance allowance.
    pub async fn revoke_provenance(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
        provenance: DataProvenance,
    ) -> Result<()> {
        self.edit_rule(subject, controller, data_type, |rule| {
            rule.revoke_provenance(provenance)
        })
        .await
    }

    /// Lock the rule for a data type: the rule survives but allows
    /// nothing, and it shadows the default table.
    pub async fn lock_rule(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
    ) -> Result<()> {
        let now = now_millis();
        self.edit_rule(subject, controller, data_type, |rule| rule.lock(now))
            .await
    }

    async fn edit_rule(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
        edit: impl FnOnce(&mut AuthorizationRule),
    ) -> Result<()> {
        let mut rule = self
            .store
            .get_rule(subject, controller, data_type)
            .await?
            .unwrap_or_else(|| {
                AuthorizationRule::new(subject.clone(), controller.clone(), data_type)
            });
        edit(&mut rule);
        self.store.upsert_rule(&rule).await?;
        tracing::info!(subject = %subject, controller = %controller, ?data_type,
            locked = rule.is_locked(), "authorization rule updated");
        Ok(())
    }

    // Housekeeping and audit

    /// Drop nonces too old to ever pass the freshness check again.
    pub async fn prune_nonces(&self) -> Result<u64> {
        let horizon = self.guard.prune_horizon(now_millis());
        Ok(self.store.prune_nonces(horizon).await?)
    }

    /// All recorded authorization decisions about a subject, oldest first.
    pub async fn decisions_for(
        &self,
        subject: &SubjectId,
    ) -> Result<Vec<AuthorizationEvent>> {
        Ok(self.store.decisions_for(subject).await?)
    }
}
