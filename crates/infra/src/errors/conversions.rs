//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use s3manager_domain::S3ManagerError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub S3ManagerError);

impl From<InfraError> for S3ManagerError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<S3ManagerError> for InfraError {
    fn from(value: S3ManagerError) -> Self {
        Self(value)
    }
}

trait IntoS3ManagerError {
    fn into_s3manager(self) -> S3ManagerError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → S3ManagerError */
/* -------------------------------------------------------------------------- */

impl IntoS3ManagerError for HttpError {
    fn into_s3manager(self) -> S3ManagerError {
        if self.is_timeout() {
            return S3ManagerError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return S3ManagerError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return S3ManagerError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => S3ManagerError::Auth(message),
                404 => S3ManagerError::NotFound(message),
                400..=499 => S3ManagerError::InvalidInput(message),
                _ => S3ManagerError::Network(message),
            };
        }

        if self.is_decode() {
            return S3ManagerError::Network(format!("invalid response body: {self}"));
        }

        S3ManagerError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_s3manager())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → S3ManagerError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(S3ManagerError::Internal(format!("JSON error: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: S3ManagerError = InfraError::from(error).into();
        match mapped {
            S3ManagerError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: S3ManagerError = InfraError::from(error).into();
        assert!(matches!(mapped, S3ManagerError::Network(_)), "got {mapped:?}");
    }

    #[test]
    fn json_errors_map_to_internal() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mapped: S3ManagerError = InfraError::from(err).into();
        assert!(matches!(mapped, S3ManagerError::Internal(_)));
    }
}
