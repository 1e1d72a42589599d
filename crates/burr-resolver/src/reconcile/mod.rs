//! Post-search reconciliation
//!
//! After a search attempt every package must have one visited version that
//! satisfies all ranges registered against it. Packages without one are
//! conflicts. Each conflict is narrowed to a single winning group of ranges and
//! the dependents that asked for the losing ranges are pruned; the caller then
//! retries the search. Reconciliation only reads its inputs.

use std::collections::BTreeMap;
use std::sync::Arc;

use burr_core::error::BurrError;
use burr_core::{format_ranges, PackageId, Range, Version};
use burr_registry::{MetadataProvider, MetadataStore, RegistryMetadata};
use tracing::debug;

use crate::constraints::ConstraintRegistry;
use crate::context::{FinalAssignment, ResolutionContext};
use crate::prune::PruneSet;
use crate::semver::VersionSelector;
use crate::ResolverResult;

/// How a conflict picked its winning ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrowStrategy {
    /// The ranges' matches did not overlap; the highest range won
    Ordered,
    /// Ranges were grouped by their newest match; the newest group won
    NewestGroup,
}

/// A package whose visited versions fail some of its ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub name: String,
    /// Every range registered when the conflict was found
    pub ranges: Vec<Range>,
    pub visited: Vec<Version>,
    /// The ranges that remain after narrowing
    pub kept: Vec<Range>,
    pub strategy: NarrowStrategy,
}

impl Conflict {
    pub fn discarded(&self) -> impl Iterator<Item = &Range> {
        self.ranges.iter().filter(|range| !self.kept.contains(range))
    }
}

/// Changes a session must apply before retrying
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Narrowing {
    pub conflicts: Vec<Conflict>,
    /// Dependent versions to hide from future candidate lists
    pub pruned: Vec<PackageId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Settled(FinalAssignment),
    Narrowed(Narrowing),
}

/// Checks a finished search attempt against the full constraint set
#[derive(Debug)]
pub struct ConflictReconciler<'s, P> {
    store: &'s MetadataStore<P>,
    pruned: &'s PruneSet,
}

impl<'s, P: MetadataProvider> ConflictReconciler<'s, P> {
    pub fn new(store: &'s MetadataStore<P>, pruned: &'s PruneSet) -> Self {
        Self { store, pruned }
    }

    /// Settle the attempt or describe how to narrow it
    ///
    /// Fails with `UnresolvableConflict` when a conflicted package has no
    /// available version for any of its ranges.
    pub fn reconcile(
        &self,
        context: &ResolutionContext,
        constraints: &ConstraintRegistry,
    ) -> ResolverResult<Reconciliation> {
        let mut assignment = FinalAssignment::new();
        let mut conflicts = Vec::new();

        for (name, visited) in context.iter() {
            let ranges = constraints.ranges_for(name);
            match visited
                .iter()
                .find(|version| ranges.iter().all(|range| range.matches(version)))
            {
                Some(version) => assignment.insert(name, version.clone()),
                None => conflicts.push(self.narrow(name, ranges, visited)?),
            }
        }

        if conflicts.is_empty() {
            return Ok(Reconciliation::Settled(assignment));
        }

        let mut pruned = Vec::new();
        for conflict in &conflicts {
            for id in self.dependents_to_prune(conflict)? {
                if !pruned.contains(&id) {
                    pruned.push(id);
                }
            }
        }

        Ok(Reconciliation::Narrowed(Narrowing { conflicts, pruned }))
    }

    fn metadata(&self, name: &str) -> ResolverResult<Arc<RegistryMetadata>> {
        self.store.cached(name).ok_or_else(|| BurrError::MetadataUnavailable {
            name: name.to_string(),
            source: Box::new(BurrError::PackageNotFound {
                name: name.to_string(),
            }),
        })
    }

    /// Pick the ranges `name` keeps
    fn narrow(&self, name: &str, ranges: &[Range], visited: &[Version]) -> ResolverResult<Conflict> {
        let unresolvable = || BurrError::UnresolvableConflict {
            name: name.to_string(),
            ranges: format_ranges(ranges),
        };

        let metadata = self.metadata(name)?;
        let selector = VersionSelector::new(&metadata, self.pruned);
        let matches: Vec<(&Range, Vec<&Version>)> = ranges
            .iter()
            .map(|range| (range, selector.satisfying(range)))
            .collect();

        if matches.iter().all(|(_, versions)| versions.is_empty()) {
            return Err(unresolvable());
        }

        let (kept, strategy) = match highest_of_ordered(&matches) {
            Some(range) => (vec![range.clone()], NarrowStrategy::Ordered),
            None => (newest_group(&matches), NarrowStrategy::NewestGroup),
        };

        if kept.len() == ranges.len() {
            // every range survived, so narrowing cannot make progress
            return Err(unresolvable());
        }

        debug!(package = name, kept = %format_ranges(&kept), ?strategy, "narrowed conflict");

        Ok(Conflict {
            name: name.to_string(),
            ranges: ranges.to_vec(),
            visited: visited.to_vec(),
            kept,
            strategy,
        })
    }

    /// Dependents whose declared range on the conflicted package lost
    fn dependents_to_prune(&self, conflict: &Conflict) -> ResolverResult<Vec<PackageId>> {
        let metadata = self.metadata(&conflict.name)?;
        let selector = VersionSelector::new(&metadata, self.pruned);

        let kept_versions: Vec<&Version> = conflict
            .kept
            .iter()
            .filter_map(|range| selector.max_satisfying(range))
            .collect();
        let discarded: Vec<&Range> = conflict.discarded().collect();
        let discarded_versions: Vec<&Version> = discarded
            .iter()
            .filter_map(|range| selector.max_satisfying(range))
            .filter(|version| !kept_versions.contains(version))
            .collect();

        let mut pruned = Vec::new();
        for dependent in self.store.snapshot() {
            if dependent.name == conflict.name {
                continue;
            }
            let dependent_view = VersionSelector::new(&dependent, self.pruned);
            for manifest in dependent_view.available() {
                let Some(declared) = manifest.dependencies.get(&conflict.name) else {
                    continue;
                };
                let loses = discarded.contains(&declared)
                    || selector
                        .max_satisfying(declared)
                        .is_some_and(|version| discarded_versions.contains(&version));
                if loses {
                    pruned.push(PackageId::new(dependent.name.clone(), manifest.version.clone()));
                }
            }
        }

        Ok(pruned)
    }
}

/// The highest range when the ranges' matches are disjoint and strictly ordered
fn highest_of_ordered<'r>(matches: &[(&'r Range, Vec<&Version>)]) -> Option<&'r Range> {
    if matches.iter().any(|(_, versions)| versions.is_empty()) {
        return None;
    }

    let mut spans: Vec<(&Version, &Version, &'r Range)> = matches
        .iter()
        .filter_map(|(range, versions)| Some((*versions.first()?, *versions.last()?, *range)))
        .collect();
    spans.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));

    let ordered = spans.windows(2).all(|pair| pair[0].1 < pair[1].0);
    if ordered {
        spans.last().map(|(_, _, range)| *range)
    } else {
        None
    }
}

/// Ranges whose newest match is the newest of all, in registration order
fn newest_group(matches: &[(&Range, Vec<&Version>)]) -> Vec<Range> {
    let mut groups: BTreeMap<&Version, Vec<Range>> = BTreeMap::new();
    for (range, versions) in matches {
        if let Some(newest) = versions.last() {
            groups.entry(*newest).or_default().push((*range).clone());
        }
    }
    groups.pop_last().map(|(_, ranges)| ranges).unwrap_or_default()
}
