//! HTTP error responses
//!
//! Every error renders as `{"error": "<message>"}` with the matching status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use s3manager_core::LoginError;
use s3manager_domain::S3ManagerError;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Signed in, but without the permission the route needs
    #[error("{0}")]
    Forbidden(String),

    /// The identity provider failed or was unreachable
    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn authentication_required() -> Self {
        Self::Unauthorized("Authentication required".to_string())
    }

    pub fn insufficient_permissions() -> Self {
        Self::Forbidden("Insufficient permissions".to_string())
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::UnknownOrExpiredState => {
                Self::Unauthorized("Invalid or expired login request".to_string())
            }
            LoginError::NonceMismatch => Self::Unauthorized("Authentication failed".to_string()),
            LoginError::Provider(err) => err.into(),
        }
    }
}

impl From<S3ManagerError> for ApiError {
    fn from(err: S3ManagerError) -> Self {
        match err {
            S3ManagerError::Config(_) | S3ManagerError::Internal(_) => Self::Internal(err.to_string()),
            S3ManagerError::InvalidInput(msg) => Self::BadRequest(msg),
            S3ManagerError::Network(_)
            | S3ManagerError::Auth(_)
            | S3ManagerError::Security(_)
            | S3ManagerError::NotFound(_) => Self::BadGateway(err.to_string()),
        }
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session store error: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Internal(detail) => {
                error!(error = %detail, "internal server error");
                "Internal server error".to_string()
            }
            Self::BadGateway(detail) => {
                error!(error = %detail, "identity provider error");
                "Authentication provider error".to_string()
            }
            Self::BadRequest(msg) | Self::Unauthorized(msg) | Self::Forbidden(msg) => msg,
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_errors_map_to_statuses() {
        assert_eq!(ApiError::from(LoginError::UnknownOrExpiredState).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(LoginError::NonceMismatch).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(LoginError::Provider(S3ManagerError::Network("down".into()))).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(LoginError::Provider(S3ManagerError::Config("bad".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn access_errors_keep_their_messages() {
        assert_eq!(ApiError::authentication_required().status(), StatusCode::UNAUTHORIZED);
        let forbidden = ApiError::insufficient_permissions();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(forbidden.to_string(), "Insufficient permissions");
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let response = ApiError::Internal("db password wrong".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
