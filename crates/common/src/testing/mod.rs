//! Testing utilities
//!
//! - **[`mocks`]**: scripted implementations of the crate's traits
//!
//! The [`MockClock`] lives in [`crate::time`] and is re-exported here.

pub mod mocks;

pub use mocks::MockSessionRefresher;

pub use crate::time::MockClock;
