//! Portal API client
//!
//! Client-side view of the S3 Manager server: every call goes through the
//! [`AuthenticatedRequestGateway`], so an expired session is refreshed once
//! and the call retried transparently.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Method, Url};
use s3manager_common::auth::SessionRefreshCoordinator;
use s3manager_domain::constants::{APP_NAME, APP_VERSION, USER_PATH};
use s3manager_domain::AuthenticatedUser;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::errors::PortalError;
use super::refresh::HttpSessionRefresher;
use crate::http::{AuthenticatedRequestGateway, HttpClient, ReplayableRequest};

/// Configuration for [`PortalClient`]
#[derive(Debug, Clone)]
pub struct PortalClientConfig {
    /// Server base URL, e.g. `https://s3.example.com`
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for PortalClientConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8080".to_string(), timeout: Duration::from_secs(30) }
    }
}

/// Authenticated client for the portal API
#[derive(Clone)]
pub struct PortalClient {
    base_url: Url,
    gateway: AuthenticatedRequestGateway,
    cookies: Arc<Jar>,
}

impl PortalClient {
    /// Create a client with its own cookie jar and refresh coordinator
    ///
    /// # Errors
    /// Returns [`PortalError::Config`] when the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: PortalClientConfig) -> Result<Self, PortalError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| PortalError::Config(format!("invalid base URL: {err}")))?;
        let cookies = Arc::new(Jar::default());

        let client = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(1)
            .user_agent(format!("{APP_NAME}/{APP_VERSION}"))
            .cookie_jar(Arc::clone(&cookies))
            .build()?;

        let refresher = HttpSessionRefresher::new(client.clone(), &base_url)
            .map_err(|err| PortalError::Config(format!("invalid refresh URL: {err}")))?;
        let coordinator = SessionRefreshCoordinator::new(Arc::new(refresher));

        Ok(Self { base_url, gateway: AuthenticatedRequestGateway::new(client, coordinator), cookies })
    }

    /// Absolute URL for `path`
    ///
    /// # Errors
    /// Returns [`PortalError::Config`] when `path` cannot be joined.
    pub fn url(&self, path: &str) -> Result<Url, PortalError> {
        self.base_url
            .join(path)
            .map_err(|err| PortalError::Config(format!("invalid path {path}: {err}")))
    }

    /// Seed the jar with a cookie for the portal origin
    pub fn add_cookie(&self, cookie: &str) {
        self.cookies.add_cookie_str(cookie, &self.base_url);
    }

    /// Send a request through the gateway, returning the raw response
    ///
    /// # Errors
    /// Returns [`PortalError`] when no response could be obtained.
    pub async fn send(&self, request: &ReplayableRequest) -> Result<reqwest::Response, PortalError> {
        Ok(self.gateway.send(request).await?)
    }

    /// GET `path` and decode a JSON body
    ///
    /// # Errors
    /// Returns [`PortalError`] for transport failures, non-2xx statuses (after
    /// the refresh-and-retry cycle) and undecodable bodies.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortalError> {
        let url = self.url(path)?;
        let request = ReplayableRequest::new(Method::GET, url.clone());
        let response = self.send(&request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortalError::from_status(status, url.as_str(), &body));
        }

        debug!(%status, "decoding JSON response");
        response.json::<T>().await.map_err(|err| PortalError::Decode(err.to_string()))
    }

    /// The signed-in user
    ///
    /// # Errors
    /// Returns [`PortalError::Auth`] when the session is gone and cannot be
    /// refreshed.
    pub async fn current_user(&self) -> Result<AuthenticatedUser, PortalError> {
        self.get_json(USER_PATH).await
    }

    pub fn gateway(&self) -> &AuthenticatedRequestGateway {
        &self.gateway
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}
