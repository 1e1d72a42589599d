//! Per-attempt record of visited versions and the settled assignment.

use std::collections::BTreeMap;

use burr_core::{PackageId, Range, Version};
use indexmap::IndexMap;
use serde::Serialize;

/// Versions visited per package during one resolution attempt
///
/// Names keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    visited: IndexMap<String, Vec<Version>>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit; returns false if the pair was already present
    pub fn record(&mut self, name: &str, version: Version) -> bool {
        let versions = self.visited.entry(name.to_string()).or_default();
        if versions.contains(&version) {
            return false;
        }
        versions.push(version);
        true
    }

    pub fn contains(&self, name: &str, version: &Version) -> bool {
        self.visited
            .get(name)
            .is_some_and(|versions| versions.contains(version))
    }

    /// Withdraw a version whose subtree failed
    pub fn forget(&mut self, name: &str, version: &Version) {
        if let Some(versions) = self.visited.get_mut(name) {
            versions.retain(|v| v != version);
            if versions.is_empty() {
                self.visited.shift_remove(name);
            }
        }
    }

    pub fn visited(&self, name: &str) -> &[Version] {
        self.visited.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Version])> {
        self.visited
            .iter()
            .map(|(name, versions)| (name.as_str(), versions.as_slice()))
    }

    /// Number of packages with at least one visited version
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

/// One version per package, valid against every registered range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinalAssignment {
    versions: BTreeMap<String, Version>,
}

impl FinalAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, version: Version) {
        self.versions.insert(name.into(), version);
    }

    pub fn get(&self, name: &str) -> Option<&Version> {
        self.versions.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Version)> {
        self.versions.iter().map(|(name, version)| (name.as_str(), version))
    }

    pub fn package_ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.versions
            .iter()
            .map(|(name, version)| PackageId::new(name.clone(), version.clone()))
    }

    /// Check every entry against the ranges `ranges_for` reports for it
    pub fn satisfies<'r>(&self, ranges_for: impl Fn(&str) -> &'r [Range]) -> bool {
        self.versions
            .iter()
            .all(|(name, version)| ranges_for(name).iter().all(|range| range.matches(version)))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
