//! Shared infrastructure for S3 Manager crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: PKCE and token generation, the authorization request
//!   store, clock abstractions
//! - `runtime`: async infrastructure (single-flight session refresh, tracing)
//! - `test-utils`: mock implementations for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;
#[cfg(feature = "foundation")]
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(all(feature = "runtime", any(feature = "test-utils", test)))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::{AuthorizationRequestStore, IssuedAuthorizationRequest, RedeemedAuthorizationRequest};
#[cfg(feature = "runtime")]
pub use auth::{RefreshError, SessionRefreshCoordinator, SessionRefresher};
#[cfg(feature = "foundation")]
pub use time::{Clock, MockClock, SystemClock};
