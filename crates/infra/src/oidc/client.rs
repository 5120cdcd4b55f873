//! OIDC client
//!
//! Implements the [`IdentityProvider`] port against a real provider:
//! authorization URL building, form-encoded token requests, user info and
//! role discovery.

use async_trait::async_trait;
use reqwest::{Method, Response};
use s3manager_core::auth::{
    AuthorizationUrlParams, IdentityProvider, ProviderTokens, UserInfo,
};
use s3manager_domain::{OidcConfig, Result, S3ManagerError};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::claims::{decode_id_token, decode_jwt_payload, keycloak_roles, string_array};
use super::providers::{LogoutStyle, ProviderEndpoints, RoleSource};
use crate::http::HttpClient;

/// OIDC client failures
#[derive(Debug, Error)]
pub enum OidcError {
    #[error(transparent)]
    Transport(#[from] S3ManagerError),

    /// The provider answered with an OAuth error body
    #[error("OAuth error: {error}{}", describe(.description))]
    OAuth { error: String, description: Option<String> },

    #[error("{endpoint} endpoint returned status {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe(description: &Option<String>) -> String {
    description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
}

impl From<OidcError> for S3ManagerError {
    fn from(err: OidcError) -> Self {
        match err {
            OidcError::Transport(err) => err,
            OidcError::OAuth { .. } | OidcError::InvalidToken(_) => Self::Auth(err.to_string()),
            OidcError::Status { .. } | OidcError::Parse(_) => Self::Network(err.to_string()),
            OidcError::Config(message) => Self::Config(message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GraphGroups {
    #[serde(default)]
    value: Vec<GraphGroup>,
}

#[derive(Debug, Deserialize)]
struct GraphGroup {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

/// Identity provider client for one configured provider
#[derive(Clone)]
pub struct OidcClient {
    http: HttpClient,
    config: OidcConfig,
    endpoints: ProviderEndpoints,
}

impl OidcClient {
    /// Create a client for `config`
    ///
    /// # Errors
    /// Returns [`OidcError::Config`] when the provider preset cannot be
    /// resolved.
    pub fn new(config: OidcConfig, http: HttpClient) -> std::result::Result<Self, OidcError> {
        let endpoints = ProviderEndpoints::resolve(&config)?;
        debug!(provider = %config.provider, authorization = %endpoints.authorization, "OIDC client configured");
        Ok(Self { http, config, endpoints })
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    async fn token_request(
        &self,
        mut form: Vec<(&'static str, String)>,
    ) -> std::result::Result<ProviderTokens, OidcError> {
        form.push(("client_id", self.config.client_id.clone()));
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        let request = self.http.request(Method::POST, &self.endpoints.token).form(&form);
        let response = self.http.send(request).await?;

        if !response.status().is_success() {
            return Err(oauth_error(response, "token").await);
        }

        let body: TokenResponse =
            response.json().await.map_err(|err| OidcError::Parse(err.to_string()))?;
        let id_claims = body.id_token.as_deref().map(decode_id_token).transpose()?;

        Ok(ProviderTokens {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            id_token: body.id_token,
            id_claims,
            expires_in: body.expires_in,
        })
    }

    async fn graph_groups(&self, url: &str, access_token: &str) -> Vec<String> {
        let request = self.http.request(Method::GET, url).bearer_auth(access_token);
        let response = match self.http.send(request).await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "group membership lookup rejected");
                return Vec::new();
            }
            Err(err) => {
                warn!(error = %err, "group membership lookup failed");
                return Vec::new();
            }
        };

        match response.json::<GraphGroups>().await {
            Ok(groups) => groups.value.into_iter().filter_map(|g| g.display_name).collect(),
            Err(err) => {
                warn!(error = %err, "group membership response unreadable");
                Vec::new()
            }
        }
    }
}

async fn oauth_error(response: Response, endpoint: &'static str) -> OidcError {
    let status = response.status().as_u16();
    match response.json::<OAuthErrorBody>().await {
        Ok(body) => OidcError::OAuth { error: body.error, description: body.error_description },
        Err(_) => OidcError::Status { endpoint, status },
    }
}

fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn append_query(base: &str, query: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{query}")
}

#[async_trait]
impl IdentityProvider for OidcClient {
    fn authorization_url(&self, params: &AuthorizationUrlParams) -> String {
        let scope = self.config.scopes.join(" ");
        let mut query: Vec<(&str, &str)> = vec![
            ("response_type", "code"),
            ("client_id", &self.config.client_id),
            ("redirect_uri", &params.redirect_uri),
            ("scope", &scope),
            ("state", &params.state),
            ("nonce", &params.nonce),
            ("code_challenge", &params.code_challenge),
            ("code_challenge_method", "S256"),
        ];
        query.extend(self.endpoints.extra_authorize_params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        append_query(&self.endpoints.authorization, &encode_query(&query))
    }

    #[instrument(skip_all, fields(provider = %self.config.provider))]
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<ProviderTokens> {
        let tokens = self
            .token_request(vec![
                ("grant_type", "authorization_code".to_string()),
                ("code", code.to_string()),
                ("redirect_uri", redirect_uri.to_string()),
                ("code_verifier", code_verifier.to_string()),
            ])
            .await?;
        debug!(has_id_token = tokens.id_token.is_some(), "authorization code exchanged");
        Ok(tokens)
    }

    #[instrument(skip_all, fields(provider = %self.config.provider))]
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<ProviderTokens> {
        if refresh_token.is_empty() {
            return Err(S3ManagerError::Auth("no refresh token available".into()));
        }

        Ok(self
            .token_request(vec![
                ("grant_type", "refresh_token".to_string()),
                ("refresh_token", refresh_token.to_string()),
            ])
            .await?)
    }

    async fn user_info(&self, tokens: &ProviderTokens) -> Result<UserInfo> {
        let Some(url) = &self.endpoints.userinfo else {
            return tokens.id_claims.clone().map(UserInfo::from).ok_or_else(|| {
                OidcError::Config("provider has no userinfo endpoint and issued no ID token".into())
                    .into()
            });
        };

        let request = self.http.request(Method::GET, url).bearer_auth(&tokens.access_token);
        let response = self.http.send(request).await?;
        if !response.status().is_success() {
            return Err(oauth_error(response, "userinfo").await.into());
        }

        Ok(response.json::<UserInfo>().await.map_err(|err| OidcError::Parse(err.to_string()))?)
    }

    async fn user_roles(&self, tokens: &ProviderTokens, user: &UserInfo) -> Result<Vec<String>> {
        let roles = match &self.endpoints.role_source {
            RoleSource::GraphMemberOf { url } => self.graph_groups(url, &tokens.access_token).await,
            RoleSource::KeycloakToken => match decode_jwt_payload(&tokens.access_token) {
                Ok(payload) => keycloak_roles(&payload, &self.config.client_id),
                Err(err) => {
                    warn!(error = %err, "access token roles unreadable");
                    Vec::new()
                }
            },
            RoleSource::EmailDomain(table) => {
                let email = user.email_address();
                email
                    .rsplit_once('@')
                    .and_then(|(_, domain)| table.get(domain))
                    .cloned()
                    .unwrap_or_default()
            }
            RoleSource::TokenClaims => decode_jwt_payload(&tokens.access_token)
                .map(|payload| {
                    let mut roles = string_array(&payload, "/roles");
                    roles.extend(string_array(&payload, "/groups"));
                    roles
                })
                .unwrap_or_default(),
        };

        debug!(count = roles.len(), "resolved provider roles");
        Ok(roles)
    }

    fn logout_url(&self, post_logout_redirect: Option<&str>) -> String {
        let fallback = || post_logout_redirect.unwrap_or("/").to_string();

        let Some(end_session) = &self.endpoints.end_session else {
            return fallback();
        };

        match (self.endpoints.logout_style, post_logout_redirect) {
            (LogoutStyle::LocalOnly, _) => fallback(),
            (_, None) => end_session.clone(),
            (LogoutStyle::PostLogoutRedirectUri, Some(redirect)) => {
                append_query(end_session, &encode_query(&[("post_logout_redirect_uri", redirect)]))
            }
            (LogoutStyle::RedirectUri, Some(redirect)) => {
                append_query(end_session, &encode_query(&[("redirect_uri", redirect)]))
            }
        }
    }
}
