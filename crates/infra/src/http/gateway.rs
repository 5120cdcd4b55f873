//! Authenticated request gateway
//!
//! Sends a [`ReplayableRequest`]; when the answer is HTTP 401 it asks the
//! [`SessionRefreshCoordinator`] for a refresh and, if that succeeds, sends
//! the request one more time. The second response is returned whatever it
//! is. When the refresh fails the original 401 is returned unchanged.

use reqwest::{Response, StatusCode};
use s3manager_common::auth::SessionRefreshCoordinator;
use s3manager_domain::S3ManagerError;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::client::HttpClient;
use super::replay::ReplayableRequest;

/// Gateway failures
///
/// HTTP status codes, 401 included, are never errors; they come back as
/// responses.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be materialized for sending
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A send attempt produced no response
    #[error(transparent)]
    Transport(#[from] S3ManagerError),
}

/// Wraps outbound calls with refresh-then-retry-once on 401
#[derive(Clone)]
pub struct AuthenticatedRequestGateway {
    client: HttpClient,
    coordinator: SessionRefreshCoordinator,
}

impl AuthenticatedRequestGateway {
    /// Gateway sending through `client` and refreshing through `coordinator`
    pub fn new(client: HttpClient, coordinator: SessionRefreshCoordinator) -> Self {
        Self { client, coordinator }
    }

    /// Send `request`, refreshing the session and retrying at most once
    ///
    /// # Errors
    /// Returns [`GatewayError::Transport`] when a send attempt produces no
    /// response at all.
    #[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
    pub async fn send(&self, request: &ReplayableRequest) -> Result<Response, GatewayError> {
        let response = self.client.execute(request.build()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("received 401, attempting session refresh");
        if !self.coordinator.refresh().await {
            warn!("session refresh failed, returning original 401");
            return Ok(response);
        }

        debug!("session refreshed, retrying request once");
        Ok(self.client.execute(request.build()).await?)
    }

    /// Coordinator shared by every request through this gateway
    pub fn coordinator(&self) -> &SessionRefreshCoordinator {
        &self.coordinator
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}
