//! npm registry access for burr
//!
//! This crate turns registry documents into `RegistryMetadata`, fetches them over
//! HTTP with retry logic (`RegistryClient`) or from fixtures (`InMemoryRegistry`),
//! and memoizes them for one resolution session (`MetadataStore`).

pub mod api;
pub mod client;
pub mod memory;
pub mod metadata;
pub mod provider;
pub mod store;

// Re-export main types
pub use api::{DistInfo, PackageDocument, VersionDocument};
pub use client::{
    ClientConfig, RegistryClient, RetryConfig, DEFAULT_MAX_RETRIES, DEFAULT_REGISTRY,
    DEFAULT_TIMEOUT,
};
pub use memory::InMemoryRegistry;
pub use metadata::{RegistryMetadata, VersionManifest};
pub use provider::MetadataProvider;
pub use store::MetadataStore;

use burr_core::error::BurrError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, BurrError>;
