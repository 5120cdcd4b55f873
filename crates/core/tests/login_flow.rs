//! Integration tests for the login use case

mod support;

use std::sync::Arc;
use std::time::Duration;

use s3manager_common::auth::{code_challenge, AuthorizationRequestStore};
use s3manager_common::testing::MockClock;
use s3manager_core::auth::{LoginError, LoginService, RolePolicy};
use s3manager_domain::Permission;
use support::FakeIdentityProvider;

const REDIRECT_URI: &str = "http://localhost:8080/auth/callback";

fn service_with(
    provider: Arc<FakeIdentityProvider>,
    store: Arc<AuthorizationRequestStore>,
) -> LoginService {
    LoginService::new(store, provider, RolePolicy::default(), REDIRECT_URI)
}

#[tokio::test]
async fn test_begin_then_complete_login() {
    let provider = Arc::new(FakeIdentityProvider::new(&["S3-Editor"]));
    let store = Arc::new(AuthorizationRequestStore::new());
    let service = service_with(provider.clone(), store.clone());

    let redirect = service.begin_login("/docs/report.pdf");
    let params = provider.last_params();
    assert!(redirect.authorization_url.contains(&params.state));
    assert!(redirect.authorization_url.contains("code_challenge_method=S256"));
    assert_eq!(params.redirect_uri, REDIRECT_URI);
    assert_eq!(store.len(), 1);

    let completed = service.complete_login("auth-code", &params.state).await.unwrap();

    assert_eq!(completed.return_to, "/docs/report.pdf");
    assert_eq!(completed.user.name, "Ada Lovelace");
    assert_eq!(completed.user.email, "ada@example.com");
    assert_eq!(completed.user.roles, vec!["S3-Editor"]);
    assert_eq!(completed.user.permissions, vec![Permission::View, Permission::Write]);
    assert_eq!(completed.tokens.refresh_token.as_deref(), Some("refresh-1"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_verifier_sent_to_token_endpoint_matches_challenge() {
    let provider = Arc::new(FakeIdentityProvider::new(&[]));
    let service = service_with(provider.clone(), Arc::new(AuthorizationRequestStore::new()));

    service.begin_login("/");
    let params = provider.last_params();
    service.complete_login("auth-code", &params.state).await.unwrap();

    let exchanges = provider.exchanges.lock().unwrap();
    assert_eq!(exchanges.len(), 1);
    assert_eq!(exchanges[0].code, "auth-code");
    assert_eq!(exchanges[0].redirect_uri, REDIRECT_URI);
    assert_eq!(code_challenge(&exchanges[0].code_verifier), params.code_challenge);
}

#[tokio::test]
async fn test_unknown_state_never_reaches_provider() {
    let provider = Arc::new(FakeIdentityProvider::new(&[]));
    let service = service_with(provider.clone(), Arc::new(AuthorizationRequestStore::new()));

    let err = service.complete_login("auth-code", "forged-state").await.unwrap_err();

    assert!(matches!(err, LoginError::UnknownOrExpiredState));
    assert_eq!(provider.exchange_count(), 0);
}

#[tokio::test]
async fn test_replayed_callback_is_rejected() {
    let provider = Arc::new(FakeIdentityProvider::new(&[]));
    let service = service_with(provider.clone(), Arc::new(AuthorizationRequestStore::new()));

    service.begin_login("/");
    let state = provider.last_params().state;

    service.complete_login("auth-code", &state).await.unwrap();
    let err = service.complete_login("auth-code", &state).await.unwrap_err();

    assert!(matches!(err, LoginError::UnknownOrExpiredState));
    assert_eq!(provider.exchange_count(), 1);
}

#[tokio::test]
async fn test_expired_state_is_rejected() {
    let provider = Arc::new(FakeIdentityProvider::new(&[]));
    let clock = MockClock::new();
    let store = Arc::new(AuthorizationRequestStore::with_clock(Arc::new(clock.clone())));
    let service = service_with(provider.clone(), store);

    service.begin_login("/");
    let state = provider.last_params().state;
    clock.advance(Duration::from_secs(601));

    let err = service.complete_login("auth-code", &state).await.unwrap_err();
    assert!(matches!(err, LoginError::UnknownOrExpiredState));
    assert_eq!(provider.exchange_count(), 0);
}

#[tokio::test]
async fn test_nonce_mismatch_is_rejected() {
    let mut provider = FakeIdentityProvider::new(&["S3-Admin"]);
    provider.id_token_nonce = Some("someone-elses-nonce".to_string());
    let provider = Arc::new(provider);
    let service = service_with(provider.clone(), Arc::new(AuthorizationRequestStore::new()));

    service.begin_login("/");
    let err = service.complete_login("auth-code", &provider.last_params().state).await.unwrap_err();

    assert!(matches!(err, LoginError::NonceMismatch));
}

#[tokio::test]
async fn test_missing_id_token_skips_nonce_check() {
    let mut provider = FakeIdentityProvider::new(&[]);
    provider.id_token_nonce = None;
    let provider = Arc::new(provider);
    let service = service_with(provider.clone(), Arc::new(AuthorizationRequestStore::new()));

    service.begin_login("/");
    let completed =
        service.complete_login("auth-code", &provider.last_params().state).await.unwrap();

    // No recognised role: default viewer permissions apply
    assert_eq!(completed.user.permissions, vec![Permission::View]);
}

#[tokio::test]
async fn test_provider_failure_surfaces_as_provider_error() {
    let mut provider = FakeIdentityProvider::new(&[]);
    provider.fail_exchange = true;
    let provider = Arc::new(provider);
    let store = Arc::new(AuthorizationRequestStore::new());
    let service = service_with(provider.clone(), store.clone());

    service.begin_login("/");
    let state = provider.last_params().state;
    let err = service.complete_login("auth-code", &state).await.unwrap_err();

    assert!(matches!(err, LoginError::Provider(_)));
    // The request was consumed before the exchange was attempted
    assert!(store.consume(&state).is_none());
}

#[tokio::test]
async fn test_refresh_keeps_existing_refresh_token() {
    let provider = Arc::new(FakeIdentityProvider::new(&[]));
    let service = service_with(provider.clone(), Arc::new(AuthorizationRequestStore::new()));

    let tokens = service.refresh_tokens("refresh-1").await.unwrap();
    assert_eq!(tokens.access_token, "access-2");
    assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));

    assert!(matches!(service.refresh_tokens("revoked").await, Err(LoginError::Provider(_))));
}
