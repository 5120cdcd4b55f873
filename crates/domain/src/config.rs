//! Application configuration structures
//!
//! Deserialized from TOML or JSON by the infra config loader, or assembled
//! from `S3MANAGER_*` environment variables. Every section has defaults so a
//! partial file is enough.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_ROLE, DEFAULT_SESSION_LIFETIME_SECS, ROLE_ADMIN,
    ROLE_EDITOR, ROLE_VIEWER,
};
use crate::errors::{Result, S3ManagerError};
use crate::types::Permission;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Identity provider settings. Optional only in local dev mode.
    #[serde(default)]
    pub oidc: Option<OidcConfig>,
    #[serde(default)]
    pub roles: RoleConfig,
}

impl Config {
    /// Check cross-section constraints
    ///
    /// # Errors
    /// Returns [`S3ManagerError::Config`] when no identity provider is
    /// configured outside local dev mode, or a provider section is missing
    /// the fields its preset needs.
    pub fn validate(&self) -> Result<()> {
        match &self.oidc {
            Some(oidc) => oidc.validate()?,
            None if self.server.local_dev_mode => {}
            None => {
                return Err(S3ManagerError::Config(
                    "OIDC provider configuration is required unless local dev mode is enabled"
                        .to_string(),
                ))
            }
        }

        if self.server.session_lifetime_secs == 0 {
            return Err(S3ManagerError::Config(
                "session_lifetime_secs must be greater than zero".to_string(),
            ));
        }
        if self.server.sweep_interval_secs == Some(0) {
            return Err(S3ManagerError::Config(
                "sweep_interval_secs must be greater than zero when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// HTTP server and session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL, used to build the OIDC redirect URI.
    /// Defaults to `http://{host}:{port}`.
    pub public_url: Option<String>,
    pub session_lifetime_secs: u64,
    pub cookie_secure: bool,
    pub local_dev_mode: bool,
    /// Period of the background sweep of expired authorization requests.
    /// Unset disables it; lazy sweeping on access always applies.
    pub sweep_interval_secs: Option<u64>,
    /// Accept privilege elevation requests on `POST /auth/pim/elevate`
    pub pim_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            public_url: None,
            session_lifetime_secs: DEFAULT_SESSION_LIFETIME_SECS,
            cookie_secure: false,
            local_dev_mode: false,
            sweep_interval_secs: None,
            pim_enabled: false,
        }
    }
}

impl ServerConfig {
    /// Base URL the browser reaches the server at, without trailing slash
    #[must_use]
    pub fn base_url(&self) -> String {
        self.public_url.as_deref().map_or_else(
            || format!("http://{}:{}", self.host, self.port),
            |url| url.trim_end_matches('/').to_string(),
        )
    }
}

/// Supported identity provider presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(alias = "azuread")]
    Azure,
    #[default]
    Keycloak,
    Google,
    Generic,
}

impl ProviderKind {
    /// Names accepted by [`FromStr`]
    pub const SUPPORTED: [&'static str; 5] = ["azure", "azuread", "keycloak", "google", "generic"];
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Azure => "azure",
            Self::Keycloak => "keycloak",
            Self::Google => "google",
            Self::Generic => "generic",
        })
    }
}

impl FromStr for ProviderKind {
    type Err = S3ManagerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "azure" | "azuread" => Ok(Self::Azure),
            "keycloak" => Ok(Self::Keycloak),
            "google" => Ok(Self::Google),
            "generic" => Ok(Self::Generic),
            other => Err(S3ManagerError::Config(format!(
                "Unsupported OIDC provider: {other}. Supported providers: {}",
                Self::SUPPORTED.join(", ")
            ))),
        }
    }
}

/// Identity provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Keycloak: `{server}/realms/{realm}`. Generic: base for the standard
    /// endpoint paths when explicit endpoints are not given.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Azure AD tenant (directory) id
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub endpoints: EndpointOverrides,
    /// Google: e-mail domain → roles
    #[serde(default)]
    pub domain_roles: BTreeMap<String, Vec<String>>,
}

fn default_scopes() -> Vec<String> {
    ["openid", "profile", "email"].iter().map(ToString::to_string).collect()
}

impl OidcConfig {
    /// Minimal settings for `provider` with default scopes
    #[must_use]
    pub fn new(provider: ProviderKind, client_id: impl Into<String>) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            client_secret: None,
            issuer: None,
            tenant_id: None,
            scopes: default_scopes(),
            endpoints: EndpointOverrides::default(),
            domain_roles: BTreeMap::new(),
        }
    }

    /// Check that the preset has what it needs
    ///
    /// # Errors
    /// Returns [`S3ManagerError::Config`] naming the missing field.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(S3ManagerError::Config("oidc.client_id is required".to_string()));
        }

        let missing = match self.provider {
            ProviderKind::Azure if self.tenant_id.is_none() => Some("oidc.tenant_id"),
            ProviderKind::Keycloak if self.issuer.is_none() => Some("oidc.issuer"),
            ProviderKind::Generic
                if self.issuer.is_none()
                    && (self.endpoints.authorization.is_none()
                        || self.endpoints.token.is_none()) =>
            {
                Some("oidc.issuer or oidc.endpoints.authorization/token")
            }
            _ => None,
        };

        match missing {
            Some(field) => Err(S3ManagerError::Config(format!(
                "{field} is required for the {} provider",
                self.provider
            ))),
            None => Ok(()),
        }
    }
}

/// Explicit endpoint URLs, overriding the provider preset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointOverrides {
    pub authorization: Option<String>,
    pub token: Option<String>,
    pub userinfo: Option<String>,
    pub end_session: Option<String>,
    /// Azure AD: group membership endpoint (Graph `me/memberOf`)
    pub groups: Option<String>,
}

/// Role → permission policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    pub role_permissions: BTreeMap<String, Vec<Permission>>,
    pub default_role: String,
}

impl Default for RoleConfig {
    fn default() -> Self {
        let role_permissions = BTreeMap::from([
            (ROLE_VIEWER.to_string(), vec![Permission::View]),
            (ROLE_EDITOR.to_string(), vec![Permission::View, Permission::Write]),
            (ROLE_ADMIN.to_string(), Permission::ALL.to_vec()),
        ]);

        Self { role_permissions, default_role: DEFAULT_ROLE.to_string() }
    }
}
