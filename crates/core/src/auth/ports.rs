//! Port interfaces for the identity provider
//!
//! These traits define the boundary between the login use case and the
//! OIDC client in the infra layer.

use async_trait::async_trait;
use s3manager_domain::Result;
use serde::{Deserialize, Serialize};

/// Everything an authorization redirect carries besides static config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationUrlParams {
    pub redirect_uri: String,
    pub state: String,
    pub nonce: String,
    pub code_challenge: String,
}

/// Claims read from an ID token payload
///
/// Decoded without signature validation; only used for identity display and
/// nonce binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Tokens returned by the provider's token endpoint
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    /// Decoded payload of `id_token`, when one was issued
    pub id_claims: Option<IdTokenClaims>,
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for ProviderTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Profile attributes reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

impl UserInfo {
    /// Name to show for the user
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .or(self.preferred_username.as_deref())
            .unwrap_or("Unknown User")
            .to_string()
    }

    /// Best available e-mail address, empty when none was reported
    #[must_use]
    pub fn email_address(&self) -> String {
        self.email.as_deref().or(self.preferred_username.as_deref()).unwrap_or_default().to_string()
    }
}

impl From<IdTokenClaims> for UserInfo {
    fn from(claims: IdTokenClaims) -> Self {
        Self {
            sub: claims.sub,
            name: claims.name,
            email: claims.email,
            preferred_username: claims.preferred_username,
        }
    }
}

/// OIDC identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the authorization redirect URL
    fn authorization_url(&self, params: &AuthorizationUrlParams) -> String;

    /// Redeem an authorization code at the token endpoint
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<ProviderTokens>;

    /// Obtain fresh tokens with a refresh token
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<ProviderTokens>;

    /// Fetch the user's profile
    async fn user_info(&self, tokens: &ProviderTokens) -> Result<UserInfo>;

    /// Roles or groups the provider reports for the user
    async fn user_roles(&self, tokens: &ProviderTokens, user: &UserInfo) -> Result<Vec<String>>;

    /// Where to send the browser to end the provider session
    fn logout_url(&self, post_logout_redirect: Option<&str>) -> String;
}
