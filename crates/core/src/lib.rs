//! # S3 Manager Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The login use case and role policy
//!
//! ## Architecture Principles
//! - Only depends on `s3manager-common` and `s3manager-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits

pub mod auth;

pub use auth::ports::IdentityProvider;
pub use auth::{LoginError, LoginService, RolePolicy};
