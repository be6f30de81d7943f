//! End-to-end protocol flows against an in-memory agent.

use std::sync::Arc;

use keyward::bundle::{PARAM_DATA_TYPE, PARAM_DATA_USE, PARAM_PURPOSE};
use keyward::{KernelError, UnverifiedReason};
use keyward_core::{now_millis, RequestToken, Secret, SubjectId, TokenId};
use keyward_policy::{AuthorizationProcess, DataType, DataUse, Decision};
use keyward_store::{SqliteStore, Store};
use keyward_testkit::{
    DerivedKeyProvider, FailingKeyProvider, TestAgent, AUTHORIZE_URL, EXCHANGE_URL, TOKEN_URL,
};

const EMAIL_PARAMS: &[(&str, &str)] = &[
    (PARAM_DATA_TYPE, "IDENTITY"),
    (PARAM_DATA_USE, "COMPOSE_EMAIL_TO_SUBJECT"),
    (PARAM_PURPOSE, "INFORMATIVE"),
];

const HEALTH_PARAMS: &[(&str, &str)] = &[
    (PARAM_DATA_TYPE, "HEALTH"),
    (PARAM_DATA_USE, "REPORT"),
    (PARAM_PURPOSE, "INFORMATIVE"),
];

#[tokio::test]
async fn full_flow_under_default_rules() {
    let agent = TestAgent::new();
    let signer = agent.register("alice", "shop", "crm").await;

    let reply = agent
        .kernel
        .issue_token(&signer.sign(TOKEN_URL, None, &[]))
        .await
        .unwrap();
    let token = (&reply.request_token, &reply.token_secret);

    let evaluation = agent
        .kernel
        .authorize_token(&signer.sign(AUTHORIZE_URL, Some(token), EMAIL_PARAMS))
        .await
        .unwrap();
    assert_eq!(evaluation.decision, Decision::Allowed);
    assert_eq!(evaluation.process, AuthorizationProcess::Default);

    let key = agent
        .kernel
        .exchange_key(&signer.sign(
            EXCHANGE_URL,
            Some(token),
            &[(PARAM_DATA_TYPE, "IDENTITY")],
        ))
        .await
        .unwrap();
    assert!(!key.encryption_key.as_bytes().is_empty());

    let events = agent
        .kernel
        .decisions_for(&SubjectId::new("alice"))
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].decision, Decision::Allowed);
}

#[tokio::test]
async fn replayed_issue_request_rejected() {
    let agent = TestAgent::new();
    let signer = agent.register("alice", "shop", "crm").await;

    let request = signer.sign(TOKEN_URL, None, &[]);
    agent.kernel.issue_token(&request).await.unwrap();

    let err = agent.kernel.issue_token(&request).await.unwrap_err();
    assert!(matches!(
        err,
        KernelError::Unverified(UnverifiedReason::ReplayedNonce)
    ));
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let agent = TestAgent::new();
    agent.register("alice", "shop", "crm").await;

    let err = agent
        .kernel
        .register_client("alice".into(), "shop".into(), "crm".into())
        .await
        .unwrap_err();
    assert!(matches!(err, KernelError::RegistrationFailed));
}

#[tokio::test]
async fn denial_leaves_token_for_a_later_grant() {
    let agent = TestAgent::new();
    let signer = agent.register("alice", "clinic", "reporting").await;
    let alice = SubjectId::new("alice");

    let reply = agent
        .kernel
        .issue_token(&signer.sign(TOKEN_URL, None, &[]))
        .await
        .unwrap();
    let token = (&reply.request_token, &reply.token_secret);

    // No rule and no default entry for sensitive data.
    let err = agent
        .kernel
        .authorize_token(&signer.sign(AUTHORIZE_URL, Some(token), HEALTH_PARAMS))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        KernelError::AccessDenied(Decision::DeniedByDefault)
    ));

    // Alice grants the allowance; the same token can be authorized now.
    agent
        .kernel
        .allow_use(
            &alice,
            &"clinic".into(),
            DataType::Health,
            DataUse::Report,
            0,
            None,
        )
        .await
        .unwrap();

    let evaluation = agent
        .kernel
        .authorize_token(&signer.sign(AUTHORIZE_URL, Some(token), HEALTH_PARAMS))
        .await
        .unwrap();
    assert_eq!(evaluation.decision, Decision::Allowed);
    assert_eq!(evaluation.process, AuthorizationProcess::DataSubjectRules);

    // Both evaluations are on the record.
    let events = agent.kernel.decisions_for(&alice).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].decision, Decision::DeniedByDefault);
    assert_eq!(events[1].decision, Decision::Allowed);
}

#[tokio::test]
async fn locked_rule_shadows_defaults() {
    let agent = TestAgent::new();
    let signer = agent.register("alice", "shop", "crm").await;

    agent
        .kernel
        .lock_rule(&SubjectId::new("alice"), &"shop".into(), DataType::Identity)
        .await
        .unwrap();

    let reply = agent
        .kernel
        .issue_token(&signer.sign(TOKEN_URL, None, &[]))
        .await
        .unwrap();
    let token = (&reply.request_token, &reply.token_secret);

    // The default table would allow this, but the locked rule wins.
    let err = agent
        .kernel
        .authorize_token(&signer.sign(AUTHORIZE_URL, Some(token), EMAIL_PARAMS))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        KernelError::AccessDenied(Decision::DeniedByDataSubject)
    ));
}

#[tokio::test]
async fn unauthorized_token_cannot_be_exchanged_and_burns() {
    let agent = TestAgent::new();
    let signer = agent.register("alice", "shop", "crm").await;

    let reply = agent
        .kernel
        .issue_token(&signer.sign(TOKEN_URL, None, &[]))
        .await
        .unwrap();
    let token = (&reply.request_token, &reply.token_secret);

    let err = agent
        .kernel
        .exchange_key(&signer.sign(
            EXCHANGE_URL,
            Some(token),
            &[(PARAM_DATA_TYPE, "IDENTITY")],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, KernelError::InvalidRequestToken));

    // The failed exchange consumed the token.
    assert!(agent
        .kernel
        .store()
        .get_token(&reply.request_token, &signer.client_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn expired_token_rejected_at_exchange() {
    let agent = TestAgent::new();
    let signer = agent.register("alice", "shop", "crm").await;

    // A token whose one-day window closed an hour ago, authorized or not.
    let now = now_millis();
    let mut token = RequestToken::new(
        TokenId::new("expired"),
        Secret::from_bytes(vec![9; 20]),
        signer.client_id.clone(),
        now - 25 * 60 * 60 * 1000,
    );
    token.authorized = true;
    agent.kernel.store().insert_token(&token).await.unwrap();

    let err = agent
        .kernel
        .exchange_key(&signer.sign(
            EXCHANGE_URL,
            Some((&token.id, &token.secret)),
            &[(PARAM_DATA_TYPE, "IDENTITY")],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, KernelError::InvalidRequestToken));
}

#[tokio::test]
async fn concurrent_exchange_has_one_winner() {
    let agent = Arc::new(TestAgent::new());
    let signer = Arc::new(agent.register("alice", "shop", "crm").await);

    let reply = agent
        .kernel
        .issue_token(&signer.sign(TOKEN_URL, None, &[]))
        .await
        .unwrap();
    let token = (&reply.request_token, &reply.token_secret);

    agent
        .kernel
        .authorize_token(&signer.sign(AUTHORIZE_URL, Some(token), EMAIL_PARAMS))
        .await
        .unwrap();

    // Two independently signed exchange requests race for the same token.
    let requests: Vec<_> = (0..2)
        .map(|_| signer.sign(EXCHANGE_URL, Some(token), &[(PARAM_DATA_TYPE, "IDENTITY")]))
        .collect();

    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let agent = Arc::clone(&agent);
            tokio::spawn(async move { agent.kernel.exchange_key(&request).await })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
}

#[tokio::test]
async fn failing_provider_surfaces_and_burns_token() {
    let agent = TestAgent::with_provider(Arc::new(FailingKeyProvider));
    let signer = agent.register("alice", "shop", "crm").await;

    let reply = agent
        .kernel
        .issue_token(&signer.sign(TOKEN_URL, None, &[]))
        .await
        .unwrap();
    let token = (&reply.request_token, &reply.token_secret);

    agent
        .kernel
        .authorize_token(&signer.sign(AUTHORIZE_URL, Some(token), EMAIL_PARAMS))
        .await
        .unwrap();

    let err = agent
        .kernel
        .exchange_key(&signer.sign(
            EXCHANGE_URL,
            Some(token),
            &[(PARAM_DATA_TYPE, "IDENTITY")],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, KernelError::Provider(_)));
    assert!(agent
        .kernel
        .store()
        .get_token(&reply.request_token, &signer.client_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn full_flow_over_sqlite() {
    use keyward::{EscrowKernel, KernelConfig};
    use keyward_core::{ApplicationId, ControllerId};
    use keyward_testkit::RequestSigner;

    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("agent.db")).unwrap();
    let kernel = EscrowKernel::new(store, Arc::new(DerivedKeyProvider), KernelConfig::default());

    let credentials = kernel
        .register_client(
            SubjectId::new("alice"),
            ControllerId::new("shop"),
            ApplicationId::new("crm"),
        )
        .await
        .unwrap();
    let signer = RequestSigner::new(credentials);

    let reply = kernel
        .issue_token(&signer.sign(TOKEN_URL, None, &[]))
        .await
        .unwrap();
    let token = (&reply.request_token, &reply.token_secret);

    kernel
        .authorize_token(&signer.sign(AUTHORIZE_URL, Some(token), EMAIL_PARAMS))
        .await
        .unwrap();
    let key = kernel
        .exchange_key(&signer.sign(
            EXCHANGE_URL,
            Some(token),
            &[(PARAM_DATA_TYPE, "IDENTITY")],
        ))
        .await
        .unwrap();
    assert!(!key.encryption_key.as_bytes().is_empty());
}
