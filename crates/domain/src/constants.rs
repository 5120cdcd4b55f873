//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! application.

pub const APP_NAME: &str = "S3 Manager";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// Session configuration
pub const DEFAULT_SESSION_LIFETIME_SECS: u64 = 3600;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// OIDC routes
pub const CALLBACK_PATH: &str = "/auth/callback";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const USER_PATH: &str = "/auth/user";

// Role configuration
pub const DEFAULT_ROLE: &str = "S3-Viewer";
pub const ROLE_VIEWER: &str = "S3-Viewer";
pub const ROLE_EDITOR: &str = "S3-Editor";
pub const ROLE_ADMIN: &str = "S3-Admin";
