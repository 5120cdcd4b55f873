//! OAuth 2.0 authorization code flow with PKCE
//!
//! ```text
//! login start ──► AuthorizationRequestStore::create ──► redirect (state, challenge, nonce)
//! callback    ──► AuthorizationRequestStore::consume ──► verifier + nonce, at most once
//! client 401  ──► SessionRefreshCoordinator::refresh ──► one SessionRefresher call
//! ```
//!
//! # Example
//!
//! ```
//! use s3manager_common::auth::AuthorizationRequestStore;
//!
//! let store = AuthorizationRequestStore::new();
//! let issued = store.create("/docs/report.pdf");
//!
//! let redeemed = store.consume(&issued.state).unwrap();
//! assert_eq!(redeemed.return_to, "/docs/report.pdf");
//! assert!(store.consume(&issued.state).is_none());
//! ```

pub mod pkce;
pub mod request_store;

#[cfg(feature = "runtime")]
pub mod refresh;

pub use pkce::{code_challenge, fingerprint, PkcePair, CHALLENGE_METHOD};
#[cfg(feature = "runtime")]
pub use refresh::{RefreshError, SessionRefreshCoordinator, SessionRefresher};
pub use request_store::{
    AuthorizationRequestStore, IssuedAuthorizationRequest, RedeemedAuthorizationRequest,
    AUTHORIZATION_REQUEST_TTL,
};
