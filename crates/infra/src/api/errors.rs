//! Portal client error types

use s3manager_domain::S3ManagerError;
use thiserror::Error;

use crate::http::GatewayError;

/// Portal API call failures
#[derive(Debug, Error)]
pub enum PortalError {
    /// 401/403 that survived the refresh-and-retry cycle
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl PortalError {
    /// Classify a non-success status
    pub fn from_status(status: reqwest::StatusCode, url: &str, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("{url} returned status {status}")
        } else {
            format!("{url} returned status {status}: {body}")
        };

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            Self::Auth(message)
        } else if status.is_server_error() {
            Self::Server(message)
        } else if status.is_client_error() {
            Self::Client(message)
        } else {
            Self::Network(message)
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<GatewayError> for PortalError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidRequest(message) => Self::Config(message),
            GatewayError::Transport(err) => err.into(),
        }
    }
}

impl From<S3ManagerError> for PortalError {
    fn from(err: S3ManagerError) -> Self {
        match err {
            S3ManagerError::Network(message) => Self::Network(message),
            S3ManagerError::Auth(message) | S3ManagerError::Security(message) => {
                Self::Auth(message)
            }
            S3ManagerError::Config(message) => Self::Config(message),
            S3ManagerError::NotFound(message) | S3ManagerError::InvalidInput(message) => {
                Self::Client(message)
            }
            S3ManagerError::Internal(message) => Self::Server(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn status_classification() {
        assert!(PortalError::from_status(StatusCode::UNAUTHORIZED, "/auth/user", "").is_auth());
        assert!(matches!(
            PortalError::from_status(StatusCode::BAD_GATEWAY, "/auth/user", "upstream"),
            PortalError::Server(msg) if msg.contains("upstream")
        ));
        assert!(matches!(
            PortalError::from_status(StatusCode::NOT_FOUND, "/x", ""),
            PortalError::Client(_)
        ));
    }

    #[test]
    fn transport_errors_keep_category() {
        let err: PortalError =
            GatewayError::Transport(S3ManagerError::Network("refused".into())).into();
        assert!(matches!(err, PortalError::Network(_)));
    }
}
