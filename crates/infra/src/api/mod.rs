//! Client side of the portal API
//!
//! - [`HttpSessionRefresher`]: POST to the refresh endpoint with the ambient
//!   session cookie
//! - [`PortalClient`]: typed calls routed through the authenticated request
//!   gateway

pub mod client;
pub mod errors;
pub mod refresh;

pub use client::{PortalClient, PortalClientConfig};
pub use errors::PortalError;
pub use refresh::HttpSessionRefresher;
