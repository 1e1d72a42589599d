//! # burr-core
//!
//! Core types and utilities shared across all burr crates.
//!
//! This crate provides:
//! - `Range`, an npm-style version range built on top of `semver`
//! - `PackageSpec` and `ResolvedPackage` for naming packages on the way in and out
//! - `BurrError`, the unified error type, and its result alias
//! - Path helpers used when unpacking archives
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Range, PackageSpec, ResolvedPackage)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{BurrError, BurrResult};
pub use types::{
    format_ranges, validate_name, PackageId, PackageSpec, Range, RangeError, ResolvedPackage,
    Version,
};
