//! Version selection over registry metadata
//!
//! Candidate lists are built from a package's metadata minus pruned versions,
//! filtered by the ranges currently registered for it, newest first.

use std::collections::BTreeMap;

use burr_core::{PackageId, Range, Version};
use burr_registry::{RegistryMetadata, VersionManifest};

use crate::prune::PruneSet;

/// A version under consideration during search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateVersion {
    pub package_name: String,
    pub version: Version,
    pub dependencies: BTreeMap<String, Range>,
}

impl CandidateVersion {
    pub fn id(&self) -> PackageId {
        PackageId::new(self.package_name.clone(), self.version.clone())
    }
}

/// Version selector over one package's unpruned versions
#[derive(Debug, Clone, Copy)]
pub struct VersionSelector<'a> {
    metadata: &'a RegistryMetadata,
    pruned: &'a PruneSet,
}

impl<'a> VersionSelector<'a> {
    pub fn new(metadata: &'a RegistryMetadata, pruned: &'a PruneSet) -> Self {
        Self { metadata, pruned }
    }

    /// Unpruned versions, newest first
    pub fn available(&self) -> impl Iterator<Item = &'a VersionManifest> + 'a {
        let metadata = self.metadata;
        let pruned = self.pruned;
        metadata
            .newest_first()
            .filter(move |manifest| !pruned.contains(&metadata.name, &manifest.version))
    }

    /// Versions satisfying any of `ranges`, newest first
    pub fn candidates(&self, ranges: &[Range]) -> Vec<CandidateVersion> {
        self.available()
            .filter(|manifest| ranges.iter().any(|range| range.matches(&manifest.version)))
            .map(|manifest| CandidateVersion {
                package_name: self.metadata.name.clone(),
                version: manifest.version.clone(),
                dependencies: manifest.dependencies.clone(),
            })
            .collect()
    }

    /// Versions satisfying `range`, oldest first
    pub fn satisfying(&self, range: &Range) -> Vec<&'a Version> {
        let mut versions: Vec<&'a Version> = self
            .available()
            .map(|manifest| &manifest.version)
            .filter(|version| range.matches(version))
            .collect();
        versions.reverse();
        versions
    }

    /// Newest version satisfying `range`
    pub fn max_satisfying(&self, range: &Range) -> Option<&'a Version> {
        self.available()
            .map(|manifest| &manifest.version)
            .find(|version| range.matches(version))
    }
}
