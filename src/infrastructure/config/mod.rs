//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - Programmatic defaults
//! - Project YAML files under `.iconesign/`
//! - `ICONESIGN_*` environment overrides
//! - Validation after extraction

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
