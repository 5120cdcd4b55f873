//! Authentication endpoints
//!
//! - `GET /auth/login`: issue a pending authorization request and redirect
//!   to the provider (or sign in a local developer directly)
//! - `GET /auth/callback`: redeem the request and start the session
//! - `POST /auth/refresh`: extend the session, refreshing provider tokens
//!   when a refresh token is held
//! - `GET /auth/user`: the signed-in user
//! - `GET /auth/logout`: end the session
//! - `POST /auth/pim/elevate`: request a privileged role, when enabled

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use s3manager_common::time::{Clock, SystemClock};
use s3manager_core::auth::SessionTokens;
use s3manager_core::LoginError;
use s3manager_domain::constants::ROLE_ADMIN;
use s3manager_domain::{AuthenticatedUser, S3ManagerError};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::context::AppContext;
use super::guard::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::utils::logging::login_error_label;
use crate::utils::return_to::sanitize_return_to;

pub const USER_KEY: &str = "user";
pub const TOKENS_KEY: &str = "tokens";
pub const REFRESHED_AT_KEY: &str = "refreshed_at";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub return_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ElevationRequest {
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ElevationResponse {
    pub message: &'static str,
    pub role: String,
    pub status: &'static str,
}

/// 302 to `location`
fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

fn local_dev_user(ctx: &AppContext) -> AuthenticatedUser {
    let roles = vec![ROLE_ADMIN.to_string()];
    let permissions = ctx.policy.permissions_for(&roles);
    AuthenticatedUser {
        name: "Local Developer".to_string(),
        email: "developer@localhost".to_string(),
        roles,
        permissions,
    }
}

#[instrument(skip_all)]
pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> ApiResult<Response> {
    let return_to = sanitize_return_to(query.return_to.as_deref());

    if ctx.config.server.local_dev_mode {
        session.cycle_id().await?;
        session.insert(USER_KEY, local_dev_user(&ctx)).await?;
        info!(%return_to, "local dev login");
        return Ok(found(return_to));
    }

    let redirect = ctx.login_service()?.begin_login(&return_to);
    Ok(found(redirect.authorization_url))
}

#[instrument(skip_all)]
pub async fn callback(
    State(ctx): State<Arc<AppContext>>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Response> {
    if let Some(error) = query.error {
        warn!(%error, "identity provider returned an error");
        return Err(ApiError::BadRequest(
            query.error_description.unwrap_or_else(|| "Authentication failed".to_string()),
        ));
    }

    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        return Err(ApiError::BadRequest("No authorization code received".to_string()));
    };
    let state = query.state.unwrap_or_default();

    let completed = match ctx.login_service()?.complete_login(&code, &state).await {
        Ok(completed) => completed,
        Err(err) => {
            warn!(reason = login_error_label(&err), "login rejected");
            return Err(err.into());
        }
    };

    session.cycle_id().await?;
    session.insert(USER_KEY, &completed.user).await?;
    session.insert(TOKENS_KEY, &completed.tokens).await?;

    Ok(found(completed.return_to))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(ctx): State<Arc<AppContext>>,
    session: Session,
) -> ApiResult<StatusCode> {
    if session.get::<AuthenticatedUser>(USER_KEY).await?.is_none() {
        return Err(ApiError::authentication_required());
    }

    let refresh_token = session
        .get::<SessionTokens>(TOKENS_KEY)
        .await?
        .and_then(|tokens| tokens.refresh_token);

    if let (Some(login), Some(refresh_token)) = (ctx.login.as_deref(), refresh_token) {
        match login.refresh_tokens(&refresh_token).await {
            Ok(tokens) => session.insert(TOKENS_KEY, tokens).await?,
            Err(err) => {
                warn!(reason = login_error_label(&err), "provider token refresh failed");
                if matches!(err, LoginError::Provider(S3ManagerError::Auth(_))) {
                    session.flush().await?;
                }
                return Err(ApiError::Unauthorized("Session refresh failed".to_string()));
            }
        }
    }

    session.insert(REFRESHED_AT_KEY, SystemClock.millis_since_epoch()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn user(CurrentUser(user): CurrentUser) -> Json<AuthenticatedUser> {
    Json(user)
}

#[instrument(skip_all)]
pub async fn logout(State(ctx): State<Arc<AppContext>>, session: Session) -> ApiResult<Response> {
    session.flush().await?;

    let destination = match ctx.login.as_deref() {
        Some(login) if !ctx.config.server.local_dev_mode => {
            let home = format!("{}/", ctx.config.server.base_url());
            login.logout_url(Some(&home))
        }
        _ => "/".to_string(),
    };

    info!("session ended");
    Ok(found(destination))
}

/// Record a privilege elevation request for the signed-in user
///
/// Activation happens at the directory; the request is only acknowledged
/// here as `pending`.
#[instrument(skip_all)]
pub async fn pim_elevate(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> ApiResult<Json<ElevationResponse>> {
    if !ctx.config.server.pim_enabled {
        return Err(ApiError::BadRequest("PIM is not enabled".to_string()));
    }

    let request = if body.is_empty() {
        ElevationRequest::default()
    } else {
        serde_json::from_slice::<ElevationRequest>(&body)
            .map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))?
    };
    let Some(role) = request.role.filter(|role| !role.trim().is_empty()) else {
        return Err(ApiError::BadRequest("Role is required".to_string()));
    };

    info!(%role, user = %user.name, "privilege elevation requested");
    Ok(Json(ElevationResponse {
        message: "PIM elevation request submitted",
        role,
        status: "pending",
    }))
}
