//! Shared test helpers for `s3manager-core` integration tests.

pub mod provider;

pub use provider::FakeIdentityProvider;
