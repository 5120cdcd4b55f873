//! Login use case
//!
//! Wires the authorization request store, the identity provider and the role
//! policy into the two server-side boundaries of the authorization code flow:
//! [`LoginService::begin_login`] issues a pending request and
//! [`LoginService::complete_login`] redeems it.

use std::sync::Arc;

use s3manager_common::auth::pkce::fingerprint;
use s3manager_common::auth::AuthorizationRequestStore;
use s3manager_domain::{AuthenticatedUser, S3ManagerError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::policy::RolePolicy;
use super::ports::{AuthorizationUrlParams, IdentityProvider, ProviderTokens};

/// Login failures
#[derive(Debug, Error)]
pub enum LoginError {
    /// The callback's `state` was never issued, was already redeemed, or is
    /// older than the TTL
    #[error("unknown or expired authorization state")]
    UnknownOrExpiredState,

    /// The ID token was minted for a different login attempt
    #[error("ID token nonce does not match the authorization request")]
    NonceMismatch,

    #[error(transparent)]
    Provider(#[from] S3ManagerError),
}

/// Redirect that starts a login at the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub authorization_url: String,
}

/// Provider credentials kept in the server-side session
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

impl From<ProviderTokens> for SessionTokens {
    fn from(tokens: ProviderTokens) -> Self {
        Self { access_token: tokens.access_token, refresh_token: tokens.refresh_token }
    }
}

/// Result of a redeemed login
#[derive(Debug, Clone)]
pub struct CompletedLogin {
    pub user: AuthenticatedUser,
    pub return_to: String,
    pub tokens: SessionTokens,
}

/// Authorization code + PKCE login
pub struct LoginService {
    store: Arc<AuthorizationRequestStore>,
    provider: Arc<dyn IdentityProvider>,
    policy: RolePolicy,
    redirect_uri: String,
}

impl LoginService {
    /// Create a login service
    ///
    /// `redirect_uri` is the absolute callback URL registered with the
    /// provider.
    pub fn new(
        store: Arc<AuthorizationRequestStore>,
        provider: Arc<dyn IdentityProvider>,
        policy: RolePolicy,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self { store, provider, policy, redirect_uri: redirect_uri.into() }
    }

    /// Issue a pending authorization request and build the provider redirect
    pub fn begin_login(&self, return_to: &str) -> LoginRedirect {
        let issued = self.store.create(return_to);
        debug!(state = %fingerprint(&issued.state), return_to, "issued authorization request");

        let authorization_url = self.provider.authorization_url(&AuthorizationUrlParams {
            redirect_uri: self.redirect_uri.clone(),
            state: issued.state.clone(),
            nonce: issued.nonce.clone(),
            code_challenge: issued.code_challenge.clone(),
        });

        LoginRedirect { authorization_url }
    }

    /// Redeem the pending request for `state` and establish the user
    ///
    /// # Errors
    /// - [`LoginError::UnknownOrExpiredState`] when `state` cannot be redeemed;
    ///   the provider is not contacted in that case
    /// - [`LoginError::NonceMismatch`] when the ID token's `nonce` claim differs
    ///   from the one issued
    /// - [`LoginError::Provider`] when the token exchange or profile lookup
    ///   fails
    #[instrument(skip_all, fields(state = %fingerprint(state)))]
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<CompletedLogin, LoginError> {
        let Some(pending) = self.store.consume(state) else {
            warn!("callback state unknown, already used or expired");
            return Err(LoginError::UnknownOrExpiredState);
        };

        let tokens =
            self.provider.exchange_code(code, &pending.code_verifier, &self.redirect_uri).await?;

        if let Some(nonce) = tokens.id_claims.as_ref().and_then(|claims| claims.nonce.as_deref()) {
            if nonce != pending.nonce {
                warn!("ID token nonce mismatch");
                return Err(LoginError::NonceMismatch);
            }
        }

        let info = self.provider.user_info(&tokens).await?;
        let roles = self.provider.user_roles(&tokens, &info).await?;
        let permissions = self.policy.permissions_for(&roles);

        let user = AuthenticatedUser {
            name: info.display_name(),
            email: info.email_address(),
            roles,
            permissions,
        };
        info!(email = %user.email, roles = user.roles.len(), "login completed");

        Ok(CompletedLogin { user, return_to: pending.return_to, tokens: tokens.into() })
    }

    /// Trade a refresh token for fresh provider tokens
    ///
    /// A provider that omits a new refresh token leaves the old one in force.
    ///
    /// # Errors
    /// Returns [`LoginError::Provider`] when the provider rejects the refresh.
    #[instrument(skip_all)]
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<SessionTokens, LoginError> {
        let tokens = self.provider.refresh_tokens(refresh_token).await?;
        let mut session_tokens = SessionTokens::from(tokens);
        if session_tokens.refresh_token.is_none() {
            session_tokens.refresh_token = Some(refresh_token.to_string());
        }
        debug!("provider tokens refreshed");
        Ok(session_tokens)
    }

    /// Provider logout URL
    pub fn logout_url(&self, post_logout_redirect: Option<&str>) -> String {
        self.provider.logout_url(post_logout_redirect)
    }

    /// Callback URL sent to the provider
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn store(&self) -> &Arc<AuthorizationRequestStore> {
        &self.store
    }
}
