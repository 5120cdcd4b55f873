//! # S3 Manager Domain
//!
//! Business domain types and models for S3 Manager.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Permission and user types
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other S3 Manager crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
