//! Configuration loading
//!
//! Builds a [`s3manager_domain::Config`] from `S3MANAGER_*` environment
//! variables or a TOML/JSON config file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
