//! Depth-first backtracking search
//!
//! For each package the search tries candidates newest first and accepts the
//! first one whose whole dependency subtree resolves. A failed candidate is
//! withdrawn and the next older one tried; packages accepted earlier in the
//! traversal are never revisited. A `(name, version)` pair already in the
//! context counts as satisfied, which is what ends dependency cycles.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use burr_core::error::BurrError;
use burr_core::{format_ranges, PackageId, Range, Version};
use burr_registry::{MetadataProvider, MetadataStore};
use tracing::debug;

use crate::constraints::ConstraintRegistry;
use crate::context::ResolutionContext;
use crate::prune::PruneSet;
use crate::semver::{CandidateVersion, VersionSelector};
use crate::ResolverResult;

type NodeFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult<Version>> + 'a>>;

/// Counters for one search attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptStats {
    /// Candidates whose dependencies were loaded
    pub expansions: usize,
    /// Candidates withdrawn after their subtree failed
    pub backtracks: usize,
}

/// What one completed search attempt produced
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub root: Version,
    pub context: ResolutionContext,
    pub stats: AttemptStats,
}

#[derive(Debug, Default)]
struct Attempt {
    context: ResolutionContext,
    rejected: HashSet<PackageId>,
    stats: AttemptStats,
}

/// Chain of dependents leading to the package being loaded
struct DependencyTrail<'t> {
    name: &'t str,
    version: &'t Version,
    parent: Option<&'t DependencyTrail<'t>>,
}

impl fmt::Display for DependencyTrail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)?;
        let mut parent = self.parent;
        while let Some(link) = parent {
            write!(f, " <- {}=={}", link.name, link.version)?;
            parent = link.parent;
        }
        Ok(())
    }
}

/// Single-attempt resolver over a session's store and pruned view
#[derive(Debug)]
pub struct Resolver<'s, P> {
    store: &'s MetadataStore<P>,
    pruned: &'s PruneSet,
}

impl<'s, P: MetadataProvider> Resolver<'s, P> {
    pub fn new(store: &'s MetadataStore<P>, pruned: &'s PruneSet) -> Self {
        Self { store, pruned }
    }

    /// Run one attempt from `root`, registering `range` for it first
    ///
    /// Fails with `NoCandidateVersion`/`NoFeasibleVersion` when the root cannot be
    /// satisfied and with `MetadataUnavailable` as soon as any fetch fails.
    pub async fn resolve(
        &self,
        constraints: &mut ConstraintRegistry,
        root: &str,
        range: &Range,
    ) -> ResolverResult<SearchOutcome> {
        constraints.get_or_create(root, range);

        let mut attempt = Attempt::default();
        let version = self.resolve_node(constraints, &mut attempt, root, None).await?;

        debug!(
            root,
            version = %version,
            expansions = attempt.stats.expansions,
            backtracks = attempt.stats.backtracks,
            "search attempt finished"
        );

        Ok(SearchOutcome {
            root: version,
            context: attempt.context,
            stats: attempt.stats,
        })
    }

    /// Resolve `name` and its subtree into the attempt's context
    fn resolve_node<'a>(
        &'a self,
        constraints: &'a mut ConstraintRegistry,
        attempt: &'a mut Attempt,
        name: &'a str,
        trail: Option<&'a DependencyTrail<'a>>,
    ) -> NodeFuture<'a> {
        Box::pin(async move {
            let metadata = self.store.fetch(name).await?;
            let ranges = constraints.ranges_for(name).to_vec();
            let candidates = VersionSelector::new(&metadata, self.pruned).candidates(&ranges);

            if candidates.is_empty() {
                return Err(BurrError::NoCandidateVersion {
                    name: name.to_string(),
                    ranges: format_ranges(&ranges),
                });
            }

            for candidate in candidates {
                if attempt.context.contains(name, &candidate.version) {
                    debug!(package = name, version = %candidate.version, "already visited");
                    return Ok(candidate.version);
                }
                let id = candidate.id();
                if attempt.rejected.contains(&id) {
                    continue;
                }

                attempt.context.record(name, candidate.version.clone());
                attempt.stats.expansions += 1;

                let link = DependencyTrail {
                    name,
                    version: &candidate.version,
                    parent: trail,
                };
                match self.expand(constraints, attempt, &candidate, &link).await {
                    Ok(()) => return Ok(candidate.version),
                    Err(error) if error.is_backtracking() => {
                        debug!(trail = %link, "rejecting candidate: {}", error);
                        attempt.context.forget(name, &candidate.version);
                        attempt.rejected.insert(id);
                        attempt.stats.backtracks += 1;
                    },
                    Err(error) => return Err(error),
                }
            }

            Err(BurrError::NoFeasibleVersion {
                name: name.to_string(),
            })
        })
    }

    /// Register and resolve every dependency of `candidate`, in name order
    async fn expand(
        &self,
        constraints: &mut ConstraintRegistry,
        attempt: &mut Attempt,
        candidate: &CandidateVersion,
        trail: &DependencyTrail<'_>,
    ) -> ResolverResult<()> {
        if !candidate.dependencies.is_empty() {
            match trail.parent {
                Some(parent) => debug!("Loading dependencies of {}=={} for {}", trail.name, trail.version, parent),
                None => debug!("Loading dependencies of {}=={}", trail.name, trail.version),
            }
        }

        for (dependency, range) in &candidate.dependencies {
            constraints.get_or_create(dependency, range);
            self.resolve_node(constraints, attempt, dependency, Some(trail))
                .await?;
        }
        Ok(())
    }
}
