//! Authentication use cases and ports

pub mod policy;
pub mod ports;
pub mod service;

pub use policy::RolePolicy;
pub use ports::{AuthorizationUrlParams, IdTokenClaims, IdentityProvider, ProviderTokens, UserInfo};
pub use service::{CompletedLogin, LoginError, LoginRedirect, LoginService, SessionTokens};
