//! HTTP session refresh transport
//!
//! POSTs to the portal's refresh endpoint with no body. The session cookie
//! travels in the shared cookie jar; any 2xx is success.

use async_trait::async_trait;
use reqwest::{Method, Url};
use s3manager_common::auth::{RefreshError, SessionRefresher};
use s3manager_domain::constants::REFRESH_PATH;
use tracing::{debug, instrument};

use crate::http::HttpClient;

/// Refreshes the portal session over HTTP
#[derive(Clone)]
pub struct HttpSessionRefresher {
    client: HttpClient,
    refresh_url: Url,
}

impl HttpSessionRefresher {
    /// Refresher for the portal at `base_url`
    ///
    /// `client` must share the cookie jar of the calls being refreshed.
    pub fn new(client: HttpClient, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self { client, refresh_url: base_url.join(REFRESH_PATH)? })
    }

    pub fn refresh_url(&self) -> &Url {
        &self.refresh_url
    }
}

#[async_trait]
impl SessionRefresher for HttpSessionRefresher {
    #[instrument(skip_all, fields(url = %self.refresh_url))]
    async fn refresh_session(&self) -> Result<(), RefreshError> {
        let request = self.client.request(Method::POST, self.refresh_url.clone());
        let response = self
            .client
            .send(request)
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "session refresh accepted");
            Ok(())
        } else {
            Err(RefreshError::Rejected { status: status.as_u16() })
        }
    }
}
