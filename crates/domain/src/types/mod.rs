//! Domain types and models

pub mod permission;
pub mod user;

pub use permission::Permission;
pub use user::AuthenticatedUser;
