//! Error types and result aliases for burr operations.
//!
//! Provides a unified error type that covers every failure the resolver, the
//! registry layer and the installer can surface, with actionable messages.

use thiserror::Error;

/// Unified error type for all burr operations
#[derive(Error, Debug)]
pub enum BurrError {
    // Config errors
    #[error("Failed to parse burr.toml: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Input errors
    #[error("Invalid version range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("Invalid package spec '{spec}': {reason}")]
    InvalidPackageSpec { spec: String, reason: String },

    // Registry errors
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to parse registry document: {message}")]
    RegistryParse { message: String },

    #[error("Metadata for '{name}' is unavailable")]
    MetadataUnavailable {
        name: String,
        #[source]
        source: Box<BurrError>,
    },

    // Resolution errors
    #[error("No version of '{name}' satisfies any of [{ranges}]")]
    NoCandidateVersion { name: String, ranges: String },

    #[error("No version of '{name}' has a resolvable dependency tree")]
    NoFeasibleVersion { name: String },

    #[error("Unresolvable version conflict on '{name}': [{ranges}]")]
    UnresolvableConflict { name: String, ranges: String },

    // Install errors
    #[error("Failed to install {name}@{version}")]
    InstallFailure {
        name: String,
        version: String,
        #[source]
        source: Box<BurrError>,
    },

    #[error("Archive entry escapes the destination directory: {path}")]
    UnsafeArchivePath { path: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for burr operations
pub type BurrResult<T> = Result<T, BurrError>;

impl BurrError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Errors the resolver recovers from by trying an older candidate
    pub fn is_backtracking(&self) -> bool {
        matches!(
            self,
            BurrError::NoCandidateVersion { .. } | BurrError::NoFeasibleVersion { .. }
        )
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BurrError::Network { .. } | BurrError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            BurrError::PackageNotFound { .. } => {
                Some("Check the package name spelling or try searching the registry")
            },
            BurrError::MetadataUnavailable { .. } | BurrError::Network { .. } => {
                Some("Check your internet connection and the configured registry URL")
            },
            BurrError::InvalidRange { .. } | BurrError::InvalidPackageSpec { .. } => {
                Some("Use the form 'name' or 'name@range', e.g. 'left-pad@^1.3.0'")
            },
            BurrError::NoCandidateVersion { .. } | BurrError::NoFeasibleVersion { .. } => {
                Some("Try a wider version range for the requested package")
            },
            BurrError::UnresolvableConflict { .. } => {
                Some("Dependents require incompatible versions; try another version of the root package")
            },
            BurrError::InstallFailure { .. } => {
                Some("Re-run the install; nothing was left half-written outside the package directory")
            },
            BurrError::TomlParse { .. } | BurrError::ConfigValidation { .. } => {
                Some("Fix burr.toml or the matching BURR_* environment variable")
            },
            _ => None,
        }
    }
}
