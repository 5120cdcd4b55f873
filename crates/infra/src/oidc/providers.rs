//! Provider presets
//!
//! Resolves an [`OidcConfig`] into concrete endpoints and per-provider
//! behaviour. Explicit `endpoints.*` overrides win over every preset.

use std::collections::BTreeMap;

use s3manager_domain::{OidcConfig, ProviderKind};

use super::client::OidcError;

const AZURE_AUTHORITY: &str = "https://login.microsoftonline.com";
const GRAPH_MEMBER_OF: &str = "https://graph.microsoft.com/v1.0/me/memberOf";
const GOOGLE_AUTHORIZE: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Query parameter carrying the post-logout destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutStyle {
    /// `?post_logout_redirect_uri=` (OpenID RP-initiated logout)
    PostLogoutRedirectUri,
    /// `?redirect_uri=` (Keycloak legacy logout)
    RedirectUri,
    /// No provider logout; go straight to the destination
    LocalOnly,
}

/// Where a provider reports role membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleSource {
    /// Display names of the user's groups from Microsoft Graph
    GraphMemberOf { url: String },
    /// Realm, client and group roles inside the access token
    KeycloakToken,
    /// Static e-mail domain → roles table
    EmailDomain(BTreeMap<String, Vec<String>>),
    /// `roles` and `groups` claims of the access token
    TokenClaims,
}

/// Concrete endpoints and behaviour of one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorization: String,
    pub token: String,
    /// `None` reads identity from the ID token instead
    pub userinfo: Option<String>,
    pub end_session: Option<String>,
    pub logout_style: LogoutStyle,
    pub role_source: RoleSource,
    pub extra_authorize_params: Vec<(String, String)>,
}

impl ProviderEndpoints {
    /// Resolve the endpoints for `config`
    ///
    /// # Errors
    /// Returns [`OidcError::Config`] when the preset lacks a required field.
    pub fn resolve(config: &OidcConfig) -> Result<Self, OidcError> {
        let mut endpoints = match config.provider {
            ProviderKind::Azure => Self::azure(config)?,
            ProviderKind::Keycloak => Self::keycloak(config)?,
            ProviderKind::Google => Self::google(config),
            ProviderKind::Generic => Self::generic(config)?,
        };

        let overrides = &config.endpoints;
        if let Some(url) = &overrides.authorization {
            endpoints.authorization.clone_from(url);
        }
        if let Some(url) = &overrides.token {
            endpoints.token.clone_from(url);
        }
        if overrides.userinfo.is_some() {
            endpoints.userinfo.clone_from(&overrides.userinfo);
        }
        if overrides.end_session.is_some() {
            endpoints.end_session.clone_from(&overrides.end_session);
        }
        if let (Some(url), RoleSource::GraphMemberOf { url: graph }) =
            (&overrides.groups, &mut endpoints.role_source)
        {
            graph.clone_from(url);
        }

        Ok(endpoints)
    }

    fn azure(config: &OidcConfig) -> Result<Self, OidcError> {
        let authority = match (&config.issuer, &config.tenant_id) {
            (Some(issuer), _) => trim(issuer),
            (None, Some(tenant)) => format!("{AZURE_AUTHORITY}/{tenant}"),
            (None, None) => {
                return Err(OidcError::Config("tenant_id is required for Azure AD".into()))
            }
        };

        Ok(Self {
            authorization: format!("{authority}/oauth2/v2.0/authorize"),
            token: format!("{authority}/oauth2/v2.0/token"),
            userinfo: None,
            end_session: Some(format!("{authority}/oauth2/v2.0/logout")),
            logout_style: LogoutStyle::PostLogoutRedirectUri,
            role_source: RoleSource::GraphMemberOf { url: GRAPH_MEMBER_OF.to_string() },
            extra_authorize_params: Vec::new(),
        })
    }

    fn keycloak(config: &OidcConfig) -> Result<Self, OidcError> {
        let issuer = config.issuer.as_deref().ok_or_else(|| {
            OidcError::Config("issuer ({server_url}/realms/{realm}) is required for Keycloak".into())
        })?;
        let base = format!("{}/protocol/openid-connect", trim(issuer));

        Ok(Self {
            authorization: format!("{base}/auth"),
            token: format!("{base}/token"),
            userinfo: Some(format!("{base}/userinfo")),
            end_session: Some(format!("{base}/logout")),
            logout_style: LogoutStyle::RedirectUri,
            role_source: RoleSource::KeycloakToken,
            extra_authorize_params: Vec::new(),
        })
    }

    fn google(config: &OidcConfig) -> Self {
        Self {
            authorization: GOOGLE_AUTHORIZE.to_string(),
            token: GOOGLE_TOKEN.to_string(),
            userinfo: Some(GOOGLE_USERINFO.to_string()),
            end_session: None,
            logout_style: LogoutStyle::LocalOnly,
            role_source: RoleSource::EmailDomain(config.domain_roles.clone()),
            extra_authorize_params: vec![("access_type".to_string(), "offline".to_string())],
        }
    }

    fn generic(config: &OidcConfig) -> Result<Self, OidcError> {
        let issuer = config.issuer.as_deref().map(trim);
        let derive = |suffix: &str| issuer.as_ref().map(|base| format!("{base}/{suffix}"));

        let authorization = derive("authorize")
            .or_else(|| config.endpoints.authorization.clone())
            .ok_or_else(|| OidcError::Config("generic provider needs an authorization endpoint".into()))?;
        let token = derive("token")
            .or_else(|| config.endpoints.token.clone())
            .ok_or_else(|| OidcError::Config("generic provider needs a token endpoint".into()))?;

        Ok(Self {
            authorization,
            token,
            userinfo: derive("userinfo"),
            end_session: derive("logout"),
            logout_style: LogoutStyle::PostLogoutRedirectUri,
            role_source: RoleSource::TokenClaims,
            extra_authorize_params: Vec::new(),
        })
    }
}

fn trim(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azure_uses_tenant_authority() {
        let mut config = OidcConfig::new(ProviderKind::Azure, "client");
        config.tenant_id = Some("contoso".to_string());

        let endpoints = ProviderEndpoints::resolve(&config).unwrap();
        assert_eq!(
            endpoints.authorization,
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/authorize"
        );
        assert_eq!(endpoints.userinfo, None);
        assert_eq!(
            endpoints.role_source,
            RoleSource::GraphMemberOf { url: GRAPH_MEMBER_OF.to_string() }
        );
    }

    #[test]
    fn keycloak_derives_from_realm_issuer() {
        let mut config = OidcConfig::new(ProviderKind::Keycloak, "s3-manager");
        config.issuer = Some("https://sso.example.com/realms/corp/".to_string());

        let endpoints = ProviderEndpoints::resolve(&config).unwrap();
        assert_eq!(
            endpoints.token,
            "https://sso.example.com/realms/corp/protocol/openid-connect/token"
        );
        assert_eq!(endpoints.logout_style, LogoutStyle::RedirectUri);
    }

    #[test]
    fn google_requests_offline_access() {
        let endpoints =
            ProviderEndpoints::resolve(&OidcConfig::new(ProviderKind::Google, "client")).unwrap();
        assert_eq!(
            endpoints.extra_authorize_params,
            vec![("access_type".to_string(), "offline".to_string())]
        );
        assert_eq!(endpoints.logout_style, LogoutStyle::LocalOnly);
    }

    #[test]
    fn overrides_win_over_preset() {
        let mut config = OidcConfig::new(ProviderKind::Azure, "client");
        config.tenant_id = Some("contoso".to_string());
        config.endpoints.token = Some("http://127.0.0.1:9999/token".to_string());
        config.endpoints.groups = Some("http://127.0.0.1:9999/memberOf".to_string());

        let endpoints = ProviderEndpoints::resolve(&config).unwrap();
        assert_eq!(endpoints.token, "http://127.0.0.1:9999/token");
        assert_eq!(
            endpoints.role_source,
            RoleSource::GraphMemberOf { url: "http://127.0.0.1:9999/memberOf".to_string() }
        );
    }

    #[test]
    fn generic_without_endpoints_is_config_error() {
        let result = ProviderEndpoints::resolve(&OidcConfig::new(ProviderKind::Generic, "client"));
        assert!(matches!(result, Err(OidcError::Config(_))));
    }
}
