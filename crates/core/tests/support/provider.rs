//! Scripted identity provider that records what it was asked

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use s3manager_core::auth::{
    AuthorizationUrlParams, IdTokenClaims, IdentityProvider, ProviderTokens, UserInfo,
};
use s3manager_domain::{Result, S3ManagerError};

#[derive(Debug, Clone)]
pub struct ExchangeCall {
    pub code: String,
    pub code_verifier: String,
    pub redirect_uri: String,
}

pub struct FakeIdentityProvider {
    pub roles: Vec<String>,
    /// Nonce to put in the ID token; `None` issues no ID token. The special
    /// value `"echo"` echoes the nonce from the last authorization URL.
    pub id_token_nonce: Option<String>,
    pub fail_exchange: bool,
    pub exchanges: Mutex<Vec<ExchangeCall>>,
    pub last_params: Mutex<Option<AuthorizationUrlParams>>,
    pub refreshes: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn new(roles: &[&str]) -> Self {
        Self {
            roles: roles.iter().map(ToString::to_string).collect(),
            id_token_nonce: Some("echo".to_string()),
            fail_exchange: false,
            exchanges: Mutex::new(Vec::new()),
            last_params: Mutex::new(None),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.lock().unwrap().len()
    }

    pub fn last_params(&self) -> AuthorizationUrlParams {
        self.last_params.lock().unwrap().clone().expect("no authorization URL built")
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorization_url(&self, params: &AuthorizationUrlParams) -> String {
        *self.last_params.lock().unwrap() = Some(params.clone());
        format!(
            "https://idp.test/authorize?state={}&nonce={}&code_challenge={}&code_challenge_method=S256",
            params.state, params.nonce, params.code_challenge
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<ProviderTokens> {
        self.exchanges.lock().unwrap().push(ExchangeCall {
            code: code.to_string(),
            code_verifier: code_verifier.to_string(),
            redirect_uri: redirect_uri.to_string(),
        });

        if self.fail_exchange {
            return Err(S3ManagerError::Network("token endpoint returned 500".to_string()));
        }

        let nonce = match self.id_token_nonce.as_deref() {
            Some("echo") => self.last_params.lock().unwrap().as_ref().map(|p| p.nonce.clone()),
            other => other.map(ToString::to_string),
        };

        Ok(ProviderTokens {
            access_token: "access-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            id_token: nonce.as_ref().map(|_| "header.payload.sig".to_string()),
            id_claims: nonce.map(|nonce| IdTokenClaims {
                sub: Some("user-1".to_string()),
                name: Some("Ada Lovelace".to_string()),
                email: Some("ada@example.com".to_string()),
                preferred_username: None,
                nonce: Some(nonce),
            }),
            expires_in: Some(300),
        })
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<ProviderTokens> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if refresh_token != "refresh-1" {
            return Err(S3ManagerError::Auth("invalid_grant".to_string()));
        }
        Ok(ProviderTokens {
            access_token: "access-2".to_string(),
            expires_in: Some(300),
            ..ProviderTokens::default()
        })
    }

    async fn user_info(&self, _tokens: &ProviderTokens) -> Result<UserInfo> {
        Ok(UserInfo {
            sub: Some("user-1".to_string()),
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            preferred_username: None,
        })
    }

    async fn user_roles(&self, _tokens: &ProviderTokens, _user: &UserInfo) -> Result<Vec<String>> {
        Ok(self.roles.clone())
    }

    fn logout_url(&self, post_logout_redirect: Option<&str>) -> String {
        match post_logout_redirect {
            Some(redirect) => format!("https://idp.test/logout?post_logout_redirect_uri={redirect}"),
            None => "https://idp.test/logout".to_string(),
        }
    }
}
