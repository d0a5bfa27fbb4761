//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - programmatic defaults
//! - `.vectorcase/config.yaml` and `.vectorcase/local.yaml`
//! - `VECTORCASE_*` environment overrides
//! - validation before any provider is built

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
