//! Package installation for burr
//!
//! Downloads each resolved package's tarball and unpacks it into
//! `<root>/<name>`, running packages concurrently under a semaphore.

pub mod fetcher;
pub mod installer;
pub mod tarball;

// Re-export main types
pub use fetcher::{HttpTarballFetcher, PackageFetcher};
pub use installer::{InstallReport, Installer, DEFAULT_CONCURRENCY};
pub use tarball::extract_tarball;

use burr_core::error::BurrError;

/// Result type for install operations
pub type InstallResult<T> = Result<T, BurrError>;
