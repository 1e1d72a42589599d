//! Dependency resolution engine for burr
//!
//! Resolution runs in passes. Each pass is a depth-first, backtracking search
//! from the root package (`search`) that records every version it visits. The
//! reconciler (`reconcile`) then checks that one visited version per package
//! satisfies every range declared against it; when none does, it narrows the
//! package's ranges, prunes the dependents that asked for the losing ranges,
//! and the `Session` runs another pass.

pub mod constraints;
pub mod context;
pub mod prune;
pub mod reconcile;
pub mod search;
pub mod semver;
pub mod session;

// Re-export main types
pub use constraints::{ConstraintRegistry, NodeId, PackageNode};
pub use context::{FinalAssignment, ResolutionContext};
pub use prune::PruneSet;
pub use reconcile::{Conflict, ConflictReconciler, NarrowStrategy, Narrowing, Reconciliation};
pub use search::{AttemptStats, Resolver, SearchOutcome};
pub use semver::{CandidateVersion, VersionSelector};
pub use session::{Resolution, ResolveOptions, Session, DEFAULT_MAX_PASSES};

use burr_core::error::BurrError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, BurrError>;
