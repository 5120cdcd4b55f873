//! Session-backed access checks
//!
//! [`CurrentUser`] rejects requests without a signed-in user with 401.
//! [`require_permission`] additionally rejects users missing a permission
//! with 403, and is attached per route:
//!
//! ```ignore
//! Router::new().route(
//!     "/buckets",
//!     get(list_buckets)
//!         .route_layer(middleware::from_fn_with_state(Permission::View, require_permission)),
//! )
//! ```

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum::RequestPartsExt;
use s3manager_domain::{AuthenticatedUser, Permission};
use tower_sessions::Session;
use tracing::debug;

use super::auth::USER_KEY;
use crate::errors::{ApiError, ApiResult};

/// The user stored in the session by a completed login
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extract::<Session>()
            .await
            .map_err(|(_, reason)| ApiError::Internal(reason.to_string()))?;

        session
            .get::<AuthenticatedUser>(USER_KEY)
            .await?
            .map(Self)
            .ok_or_else(ApiError::authentication_required)
    }
}

/// Middleware admitting only users granted `permission`
///
/// The admitted user is placed in the request extensions for the handler.
///
/// # Errors
/// 401 without a session user, 403 when the permission is missing.
pub async fn require_permission(
    State(permission): State<Permission>,
    CurrentUser(user): CurrentUser,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    if !user.has_permission(permission) {
        debug!(permission = %permission, path = %request.uri().path(), "permission denied");
        return Err(ApiError::insufficient_permissions());
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
