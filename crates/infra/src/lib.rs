//! # S3 Manager Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The outbound HTTP client, replayable requests and the authenticated
//!   request gateway that refreshes the session once on `401`
//! - The OIDC client for Azure AD, Keycloak, Google and generic providers
//! - The portal API client used by callers of the S3 Manager server
//! - Configuration loading from the environment and config files
//!
//! ## Architecture
//! - Implements traits defined in `s3manager-core` and `s3manager-common`
//! - Contains all "impure" code (network and filesystem I/O)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod oidc;

pub use api::{HttpSessionRefresher, PortalClient, PortalClientConfig, PortalError};
pub use errors::InfraError;
pub use http::{AuthenticatedRequestGateway, GatewayError, HttpClient, ReplayableRequest};
pub use oidc::{OidcClient, OidcError};
