//! Fixture-backed metadata provider for tests and offline use.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use burr_core::error::BurrError;
use burr_core::{Range, Version};

use crate::metadata::{RegistryMetadata, VersionManifest};
use crate::provider::MetadataProvider;
use crate::RegistryResult;

/// An in-memory registry
///
/// Counts every fetch it serves and can simulate network latency.
#[derive(Debug)]
pub struct InMemoryRegistry {
    packages: HashMap<String, RegistryMetadata>,
    tarball_base: String,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            packages: HashMap::new(),
            tarball_base: "https://registry.npmjs.org".to_string(),
            latency: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Base used when synthesising tarball URLs for published versions
    pub fn with_tarball_base(mut self, base: impl Into<String>) -> Self {
        self.tarball_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Delay every fetch by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add one version with its dependencies (`[("shared", "^1.0.0")]`)
    pub fn publish(
        &mut self,
        name: &str,
        version: &str,
        dependencies: &[(&str, &str)],
    ) -> RegistryResult<()> {
        let version = Version::parse(version).map_err(|e| BurrError::RegistryParse {
            message: format!("{}@{}: {}", name, version, e),
        })?;

        let dependencies = dependencies
            .iter()
            .map(|(dep, expr)| Ok((dep.to_string(), Range::parse(expr)?)))
            .collect::<RegistryResult<_>>()?;

        let tarball_url = format!(
            "{}/{}/-/{}-{}.tgz",
            self.tarball_base, name, name, version
        );

        self.packages
            .entry(name.to_string())
            .or_insert_with(|| RegistryMetadata::new(name))
            .insert(VersionManifest {
                version,
                dependencies,
                tarball_url,
            });
        Ok(())
    }

    /// Number of fetches served, including misses
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }
}

impl MetadataProvider for InMemoryRegistry {
    fn fetch(&self, name: &str) -> impl Future<Output = RegistryResult<RegistryMetadata>> + Send {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let result = self
            .packages
            .get(name)
            .cloned()
            .ok_or_else(|| BurrError::PackageNotFound {
                name: name.to_string(),
            });
        let latency = self.latency;

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            result
        }
    }
}
