//! # S3 Manager App
//!
//! HTTP application layer - routes, context and the server entry point.
//!
//! This crate contains:
//! - The axum router and authentication endpoints
//! - Application context (dependency injection)
//! - CLI parsing and logging setup
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod cli;
pub mod context;
pub mod errors;
pub mod routes;
pub mod utils;

pub use context::AppContext;
pub use errors::{ApiError, ApiResult};
pub use routes::guard::{require_permission, CurrentUser};
pub use routes::{router, router_with_storage};
