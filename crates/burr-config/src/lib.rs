//! Configuration parsing for burr
//!
//! This crate reads `burr.toml` (project) and `~/.burr/config.toml` (global),
//! layers them with `BURR_*` environment variables and command-line flags, and
//! produces one validated `Settings` value for a run.

pub mod merge;
pub mod toml;

// Re-export main types
pub use crate::merge::{ConfigLayering, ConfigLoader, Settings, PROJECT_CONFIG_FILE};
pub use crate::toml::{BurrToml, InstallSection, RegistrySection, ResolverSection};

use burr_core::error::BurrError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, BurrError>;
