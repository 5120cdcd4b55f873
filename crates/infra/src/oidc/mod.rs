//! OpenID Connect provider integration
//!
//! - [`providers`]: endpoint presets for Azure AD, Keycloak, Google and
//!   generic providers
//! - [`claims`]: unverified JWT payload decoding
//! - [`client`]: the [`OidcClient`] implementation of the identity provider
//!   port

pub mod claims;
pub mod client;
pub mod providers;

pub use client::{OidcClient, OidcError};
pub use providers::{LogoutStyle, ProviderEndpoints, RoleSource};
