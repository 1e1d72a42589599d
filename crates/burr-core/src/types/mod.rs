//! Core data types shared by every burr crate.
//!
//! - Versions and npm-style ranges
//! - Package specs and resolved package identities

pub mod package;
pub mod version;

pub use package::{validate_name, PackageId, PackageSpec, ResolvedPackage};
pub use version::{format_ranges, Range, RangeError, Version};
