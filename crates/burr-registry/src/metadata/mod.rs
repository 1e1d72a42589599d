//! Parsed, typed view of a registry document.

use std::collections::BTreeMap;

use burr_core::{validate_name, Range, Version};
use tracing::warn;

use crate::api::PackageDocument;

/// Every usable version of one package, keyed by version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryMetadata {
    pub name: String,
    pub versions: BTreeMap<Version, VersionManifest>,
}

/// Dependencies and tarball of one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionManifest {
    pub version: Version,
    pub dependencies: BTreeMap<String, Range>,
    pub tarball_url: String,
}

impl RegistryMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: BTreeMap::new(),
        }
    }

    /// Build metadata from a wire document
    ///
    /// Versions that are not valid semver, that declare a dependency range burr
    /// cannot read (git URLs, `file:` paths, tags), or that name a dependency
    /// which cannot be a directory under the install root, are skipped with a
    /// warning.
    pub fn from_document(document: PackageDocument) -> Self {
        let mut metadata = Self::new(document.name);

        for (key, entry) in document.versions {
            let raw = if entry.version.is_empty() { key } else { entry.version };
            let version = match Version::parse(raw.trim_start_matches('v')) {
                Ok(version) => version,
                Err(e) => {
                    warn!(package = %metadata.name, version = %raw, "skipping version: {}", e);
                    continue;
                },
            };

            let mut dependencies = BTreeMap::new();
            let mut readable = true;
            for (name, expr) in entry.dependencies.unwrap_or_default() {
                if let Err(reason) = validate_name(&name) {
                    warn!(
                        package = %metadata.name,
                        version = %version,
                        dependency = %name,
                        "skipping version with invalid dependency name: {}",
                        reason
                    );
                    readable = false;
                    break;
                }
                match Range::parse(&expr) {
                    Ok(range) => {
                        dependencies.insert(name, range);
                    },
                    Err(e) => {
                        warn!(
                            package = %metadata.name,
                            version = %version,
                            dependency = %name,
                            "skipping version with unreadable range: {}",
                            e
                        );
                        readable = false;
                        break;
                    },
                }
            }

            if readable {
                metadata.insert(VersionManifest {
                    version,
                    dependencies,
                    tarball_url: entry.dist.tarball,
                });
            }
        }

        metadata
    }

    pub fn insert(&mut self, manifest: VersionManifest) {
        self.versions.insert(manifest.version.clone(), manifest);
    }

    pub fn manifest(&self, version: &Version) -> Option<&VersionManifest> {
        self.versions.get(version)
    }

    /// Versions ordered newest to oldest
    pub fn newest_first(&self) -> impl Iterator<Item = &VersionManifest> {
        self.versions.values().rev()
    }

    /// Newest version satisfying `range`
    pub fn max_satisfying(&self, range: &Range) -> Option<&Version> {
        self.versions.keys().rev().find(|version| range.matches(version))
    }
}
