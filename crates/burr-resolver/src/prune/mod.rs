//! Versions hidden from candidate lists for the rest of a session.

use std::collections::{BTreeMap, BTreeSet};

use burr_core::{PackageId, Version};

/// A set of pruned `(package, version)` pairs
///
/// Registry metadata itself is never edited; selection consults this overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneSet {
    pruned: BTreeMap<String, BTreeSet<Version>>,
}

impl PruneSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str, version: &Version) -> bool {
        self.pruned
            .get(name)
            .is_some_and(|versions| versions.contains(version))
    }

    /// A copy of this set with `ids` added
    pub fn with_pruned<I>(&self, ids: I) -> Self
    where
        I: IntoIterator<Item = PackageId>,
    {
        let mut next = self.clone();
        for id in ids {
            next.pruned.entry(id.name).or_default().insert(id.version);
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.pruned.iter().flat_map(|(name, versions)| {
            versions
                .iter()
                .map(move |version| PackageId::new(name.clone(), version.clone()))
        })
    }

    pub fn len(&self) -> usize {
        self.pruned.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
