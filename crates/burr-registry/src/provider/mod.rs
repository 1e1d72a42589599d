//! The seam between the resolver and wherever metadata comes from.

use std::future::Future;
use std::sync::Arc;

use crate::metadata::RegistryMetadata;
use crate::RegistryResult;

/// A source of registry metadata
///
/// Implementations fail with `PackageNotFound`, `Network` or `RegistryParse`.
pub trait MetadataProvider: Send + Sync {
    fn fetch(&self, name: &str) -> impl Future<Output = RegistryResult<RegistryMetadata>> + Send;
}

impl<P: MetadataProvider> MetadataProvider for Arc<P> {
    fn fetch(&self, name: &str) -> impl Future<Output = RegistryResult<RegistryMetadata>> + Send {
        (**self).fetch(name)
    }
}
