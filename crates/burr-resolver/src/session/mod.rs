//! Resolution session: search, reconcile, narrow, retry.

use std::time::Instant;

use burr_core::error::BurrError;
use burr_core::{format_ranges, Range, ResolvedPackage};
use burr_registry::{MetadataProvider, MetadataStore};
use serde::Serialize;
use tracing::{info, warn};

use crate::constraints::ConstraintRegistry;
use crate::context::FinalAssignment;
use crate::prune::PruneSet;
use crate::reconcile::{Conflict, ConflictReconciler, Narrowing, Reconciliation};
use crate::search::Resolver;
use crate::ResolverResult;

pub const DEFAULT_MAX_PASSES: usize = 16;

/// Options for a resolution session
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Upper bound on search passes before giving up
    pub max_passes: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Result of a successful resolution
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub assignment: FinalAssignment,
    /// Assignment entries joined with their tarball URLs, by name
    pub packages: Vec<ResolvedPackage>,
    /// Search passes it took, including the settling one
    pub passes: usize,
    /// Resolution time in milliseconds
    pub resolution_time_ms: u64,
}

/// State shared by every pass of a resolution
///
/// Metadata, registered ranges and pruned versions persist across passes;
/// visited versions do not.
#[derive(Debug)]
pub struct Session<P> {
    store: MetadataStore<P>,
    constraints: ConstraintRegistry,
    pruned: PruneSet,
    options: ResolveOptions,
}

impl<P: MetadataProvider> Session<P> {
    pub fn new(provider: P, options: ResolveOptions) -> Self {
        Self {
            store: MetadataStore::new(provider),
            constraints: ConstraintRegistry::new(),
            pruned: PruneSet::new(),
            options,
        }
    }

    pub fn store(&self) -> &MetadataStore<P> {
        &self.store
    }

    pub fn constraints(&self) -> &ConstraintRegistry {
        &self.constraints
    }

    pub fn pruned(&self) -> &PruneSet {
        &self.pruned
    }

    /// Resolve `root` at `range` to one version per reachable package
    pub async fn resolve(&mut self, root: &str, range: &Range) -> ResolverResult<Resolution> {
        let start_time = Instant::now();
        let mut last_narrowed: Option<Conflict> = None;

        for pass in 1..=self.options.max_passes {
            let outcome = match Resolver::new(&self.store, &self.pruned)
                .resolve(&mut self.constraints, root, range)
                .await
            {
                Ok(outcome) => outcome,
                Err(error) if error.is_backtracking() => {
                    return Err(match &last_narrowed {
                        Some(conflict) => unresolvable(conflict),
                        None => error,
                    });
                },
                Err(error) => return Err(error),
            };

            info!(
                pass,
                packages = outcome.context.len(),
                expansions = outcome.stats.expansions,
                backtracks = outcome.stats.backtracks,
                "resolution pass finished"
            );

            let reconciliation = ConflictReconciler::new(&self.store, &self.pruned)
                .reconcile(&outcome.context, &self.constraints)?;

            match reconciliation {
                Reconciliation::Settled(assignment) => {
                    let packages = self.packages_for(&assignment).await?;
                    let resolution_time_ms = start_time.elapsed().as_millis() as u64;
                    info!(
                        root,
                        packages = packages.len(),
                        passes = pass,
                        resolution_time_ms,
                        "resolution settled"
                    );
                    return Ok(Resolution {
                        assignment,
                        packages,
                        passes: pass,
                        resolution_time_ms,
                    });
                },
                Reconciliation::Narrowed(narrowing) => {
                    for conflict in &narrowing.conflicts {
                        warn!(
                            "Conflict with {}=={}: {}; keeping {}",
                            conflict.name,
                            conflict
                                .visited
                                .iter()
                                .map(ToString::to_string)
                                .collect::<Vec<_>>()
                                .join(", "),
                            format_ranges(&conflict.ranges),
                            format_ranges(&conflict.kept)
                        );
                    }

                    let progressed = self.apply(&narrowing);
                    last_narrowed = narrowing.conflicts.last().cloned();
                    if !progressed {
                        break;
                    }
                },
            }
        }

        Err(match &last_narrowed {
            Some(conflict) => unresolvable(conflict),
            None => BurrError::UnresolvableConflict {
                name: root.to_string(),
                ranges: range.to_string(),
            },
        })
    }

    /// Apply a narrowing; returns whether anything changed
    fn apply(&mut self, narrowing: &Narrowing) -> bool {
        let mut changed = false;
        for conflict in &narrowing.conflicts {
            changed |= self.constraints.narrow(&conflict.name, &conflict.kept);
        }

        let before = self.pruned.len();
        self.pruned = self.pruned.with_pruned(narrowing.pruned.iter().cloned());
        changed || self.pruned.len() != before
    }

    async fn packages_for(&self, assignment: &FinalAssignment) -> ResolverResult<Vec<ResolvedPackage>> {
        let mut packages = Vec::with_capacity(assignment.len());
        for (name, version) in assignment.iter() {
            let metadata = self.store.fetch(name).await?;
            let manifest = metadata.manifest(version).ok_or_else(|| BurrError::RegistryParse {
                message: format!("{}@{} is missing from its registry document", name, version),
            })?;
            packages.push(ResolvedPackage {
                name: name.to_string(),
                version: version.clone(),
                tarball_url: manifest.tarball_url.clone(),
            });
        }
        Ok(packages)
    }
}

fn unresolvable(conflict: &Conflict) -> BurrError {
    BurrError::UnresolvableConflict {
        name: conflict.name.clone(),
        ranges: format_ranges(&conflict.ranges),
    }
}

#[cfg(test)]
mod tests;
