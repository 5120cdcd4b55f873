//! Logging setup and auth event labels

use s3manager_core::LoginError;
use s3manager_domain::S3ManagerError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "s3manager=info,tower_http=info";

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. Calling this twice is harmless;
/// the second call is ignored.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Stable label for a login failure, suitable for log fields
#[inline]
pub fn login_error_label(error: &LoginError) -> &'static str {
    match error {
        LoginError::UnknownOrExpiredState => "unknown_or_expired_state",
        LoginError::NonceMismatch => "nonce_mismatch",
        LoginError::Provider(err) => error_label(err),
    }
}

/// Stable label for a domain error
#[inline]
pub fn error_label(error: &S3ManagerError) -> &'static str {
    match error {
        S3ManagerError::Config(_) => "config",
        S3ManagerError::Network(_) => "network",
        S3ManagerError::Auth(_) => "auth",
        S3ManagerError::Security(_) => "security",
        S3ManagerError::NotFound(_) => "not_found",
        S3ManagerError::InvalidInput(_) => "invalid_input",
        S3ManagerError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(login_error_label(&LoginError::NonceMismatch), "nonce_mismatch");
        assert_eq!(
            login_error_label(&LoginError::Provider(S3ManagerError::Network("x".into()))),
            "network"
        );
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing(false);
        init_tracing(true);
    }
}
