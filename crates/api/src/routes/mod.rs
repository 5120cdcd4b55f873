//! HTTP routes
//!
//! `/auth/*` carries the login, callback, refresh, user and logout
//! endpoints; `/health` reports liveness. Object-storage handlers mount
//! under `/api/s3` and check permissions through [`guard`]. Sessions live in
//! an in-memory store behind an `HttpOnly`, `SameSite=Lax` cookie.

pub mod auth;
pub mod guard;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::context::AppContext;

/// Session cookie name
pub const SESSION_COOKIE: &str = "s3manager.sid";

/// Mount point of the object-storage API
pub const STORAGE_PREFIX: &str = "/api/s3";

/// Build the application router
pub fn router(ctx: Arc<AppContext>) -> Router {
    build(ctx, None)
}

/// Build the application router with `storage` nested under [`STORAGE_PREFIX`]
///
/// The storage routes share the session layer, so they can guard themselves
/// with [`guard::require_permission`].
pub fn router_with_storage(ctx: Arc<AppContext>, storage: Router<Arc<AppContext>>) -> Router {
    build(ctx, Some(storage))
}

fn build(ctx: Arc<AppContext>, storage: Option<Router<Arc<AppContext>>>) -> Router {
    let server = &ctx.config.server;
    let lifetime = i64::try_from(server.session_lifetime_secs).unwrap_or(i64::MAX);

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(server.cookie_secure)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(lifetime)));

    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/user", get(auth::user))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/pim/elevate", post(auth::pim_elevate));
    if let Some(storage) = storage {
        app = app.nest(STORAGE_PREFIX, storage);
    }

    app.with_state(ctx)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}
