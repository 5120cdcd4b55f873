//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use s3manager_common::auth::AuthorizationRequestStore;
use s3manager_core::{IdentityProvider, LoginService, RolePolicy};
use s3manager_domain::constants::{APP_NAME, APP_VERSION, CALLBACK_PATH};
use s3manager_domain::{Config, Result, S3ManagerError};
use s3manager_infra::{HttpClient, OidcClient};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Timeout for calls to the identity provider
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub store: Arc<AuthorizationRequestStore>,
    /// `None` when no identity provider is configured (local dev mode)
    pub login: Option<Arc<LoginService>>,
    pub policy: RolePolicy,
}

impl AppContext {
    /// Build the context, constructing the OIDC client from `config.oidc`
    ///
    /// # Errors
    /// Returns [`S3ManagerError::Config`] when the configuration does not
    /// validate or the provider preset cannot be resolved.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let provider: Option<Arc<dyn IdentityProvider>> = match &config.oidc {
            Some(oidc) => {
                let http = HttpClient::builder()
                    .timeout(PROVIDER_TIMEOUT)
                    .user_agent(format!("{APP_NAME}/{APP_VERSION}"))
                    .build()?;
                let client: Arc<dyn IdentityProvider> = Arc::new(
                    OidcClient::new(oidc.clone(), http).map_err(S3ManagerError::from)?,
                );
                info!(provider = %oidc.provider, "identity provider configured");
                Some(client)
            }
            None => None,
        };

        Ok(Self::assemble(config, provider))
    }

    /// Build the context around an existing identity provider
    ///
    /// # Errors
    /// Returns [`S3ManagerError::Config`] when the configuration does not
    /// validate.
    pub fn with_provider(config: Config, provider: Arc<dyn IdentityProvider>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, Some(provider)))
    }

    fn assemble(config: Config, provider: Option<Arc<dyn IdentityProvider>>) -> Self {
        let store = Arc::new(AuthorizationRequestStore::new());
        let policy = RolePolicy::new(&config.roles);
        let redirect_uri = format!("{}{CALLBACK_PATH}", config.server.base_url());

        let login = provider.map(|provider| {
            Arc::new(LoginService::new(Arc::clone(&store), provider, policy.clone(), redirect_uri))
        });

        if config.server.local_dev_mode {
            info!("local dev mode enabled, logins bypass the identity provider");
        }

        Self { config, store, login, policy }
    }

    /// The login service, or a configuration error when none is set up
    ///
    /// # Errors
    /// Returns [`S3ManagerError::Config`] when no identity provider is
    /// configured.
    pub fn login_service(&self) -> Result<&LoginService> {
        self.login
            .as_deref()
            .ok_or_else(|| S3ManagerError::Config("identity provider is not configured".into()))
    }

    /// Start the periodic sweep of expired authorization requests
    ///
    /// Returns `None` when `server.sweep_interval_secs` is unset. Expired
    /// records are also dropped lazily on every create and consume.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        let period = Duration::from_secs(self.config.server.sweep_interval_secs?);
        let store = Arc::clone(&self.store);

        info!(interval_secs = period.as_secs(), "starting authorization request sweeper");
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    debug!(purged, remaining = store.len(), "swept expired authorization requests");
                }
            }
        }))
    }
}
