//! Unit and property tests for resolution sessions

use super::*;
use crate::reconcile::NarrowStrategy;
use burr_core::{PackageId, Version};
use burr_registry::InMemoryRegistry;
use std::sync::Arc;

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

/// app -> left ^1, right ^1; left@1.2.0 wants shared ^1, right wants shared ^2
fn scenario(left_has_compatible_version: bool) -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new().with_tarball_base("https://r.test");
    registry
        .publish("app", "1.0.0", &[("left", "^1.0.0"), ("right", "^1.0.0")])
        .unwrap();
    registry.publish("left", "1.2.0", &[("shared", "^1.0.0")]).unwrap();
    if left_has_compatible_version {
        registry.publish("left", "1.1.0", &[("shared", "^2.0.0")]).unwrap();
    }
    registry.publish("right", "1.0.0", &[("shared", "^2.0.0")]).unwrap();
    registry.publish("shared", "1.5.0", &[]).unwrap();
    registry.publish("shared", "2.1.0", &[]).unwrap();
    registry
}

#[tokio::test]
async fn test_conflict_is_narrowed_and_retried() {
    let registry = Arc::new(scenario(true));
    let mut session = Session::new(Arc::clone(&registry), ResolveOptions::default());

    let resolution = session.resolve("app", &Range::any()).await.unwrap();

    assert_eq!(resolution.passes, 2);
    assert_eq!(resolution.assignment.get("shared"), Some(&v("2.1.0")));
    assert_eq!(resolution.assignment.get("left"), Some(&v("1.1.0")));
    assert_eq!(resolution.assignment.get("right"), Some(&v("1.0.0")));
    assert_eq!(resolution.assignment.get("app"), Some(&v("1.0.0")));

    assert!(session.pruned().contains("left", &v("1.2.0")));
    assert_eq!(session.constraints().ranges_for("shared"), &[Range::parse("^2.0.0").unwrap()]);
    assert!(resolution
        .assignment
        .satisfies(|name| session.constraints().ranges_for(name)));

    // metadata is fetched once per package across passes
    assert_eq!(registry.fetch_count(), 4);
    assert_eq!(session.store().len(), 4);
}

#[tokio::test]
async fn test_packages_carry_tarball_urls() {
    let mut session = Session::new(scenario(true), ResolveOptions::default());
    let resolution = session.resolve("app", &Range::any()).await.unwrap();

    let names: Vec<&str> = resolution.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["app", "left", "right", "shared"]);

    let shared = &resolution.packages[3];
    assert_eq!(shared.version, v("2.1.0"));
    assert_eq!(shared.tarball_url, "https://r.test/shared/-/shared-2.1.0.tgz");
}

#[tokio::test]
async fn test_conflict_without_alternative_is_unresolvable() {
    let mut session = Session::new(scenario(false), ResolveOptions::default());

    let error = session.resolve("app", &Range::any()).await.unwrap_err();
    assert!(
        matches!(error, BurrError::UnresolvableConflict { ref name, ref ranges }
            if name == "shared" && ranges == "^1.0.0, ^2.0.0"),
        "unexpected error: {error:?}"
    );
}

#[tokio::test]
async fn test_pass_limit() {
    let options = ResolveOptions { max_passes: 1 };
    let mut session = Session::new(scenario(true), options);

    let error = session.resolve("app", &Range::any()).await.unwrap_err();
    assert!(matches!(error, BurrError::UnresolvableConflict { ref name, .. } if name == "shared"));
}

#[tokio::test]
async fn test_resolution_is_repeatable() {
    let mut first = Session::new(scenario(true), ResolveOptions::default());
    let mut second = Session::new(scenario(true), ResolveOptions::default());

    let a = first.resolve("app", &Range::any()).await.unwrap();
    let b = second.resolve("app", &Range::any()).await.unwrap();
    assert_eq!(a.assignment, b.assignment);

    let again = first.resolve("app", &Range::any()).await.unwrap();
    assert_eq!(again.assignment, a.assignment);
    assert_eq!(again.passes, 1);
}

#[tokio::test]
async fn test_unknown_root() {
    let mut session = Session::new(InMemoryRegistry::new(), ResolveOptions::default());

    let error = session.resolve("ghost", &Range::any()).await.unwrap_err();
    assert!(matches!(error, BurrError::MetadataUnavailable { ref name, .. } if name == "ghost"));
}

#[tokio::test]
async fn test_unsatisfiable_root_range() {
    let mut session = Session::new(scenario(true), ResolveOptions::default());

    let error = session
        .resolve("app", &Range::parse("^3.0.0").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(error, BurrError::NoCandidateVersion { ref name, .. } if name == "app"));
}

#[test]
fn test_repeated_narrowing_makes_no_progress() {
    let mut session = Session::new(InMemoryRegistry::new(), ResolveOptions::default());
    let older = Range::parse("^1.0.0").unwrap();
    let newer = Range::parse("^2.0.0").unwrap();
    session.constraints.get_or_create("shared", &older);
    session.constraints.get_or_create("shared", &newer);

    let narrowing = Narrowing {
        conflicts: vec![Conflict {
            name: "shared".to_string(),
            ranges: vec![older, newer.clone()],
            visited: vec![v("1.5.0"), v("2.1.0")],
            kept: vec![newer.clone()],
            strategy: NarrowStrategy::Ordered,
        }],
        pruned: vec![PackageId::new("left", v("1.2.0"))],
    };

    assert!(session.apply(&narrowing));
    assert_eq!(session.constraints().ranges_for("shared"), &[newer]);
    assert!(session.pruned().contains("left", &v("1.2.0")));

    // a second identical narrowing changes nothing, so the loop must stop
    assert!(!session.apply(&narrowing));
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    const PACKAGES: usize = 4;
    const VERSIONS: [&str; 3] = ["1.0.0", "1.1.0", "2.0.0"];
    const RANGES: [&str; 5] = ["^1.0.0", "^2.0.0", "*", "~1.1.0", ">=1.1.0"];

    /// One optional range per (package, version, later package)
    fn dependency_table() -> impl Strategy<Value = Vec<Option<usize>>> {
        proptest::collection::vec(
            proptest::option::of(0..RANGES.len()),
            PACKAGES * VERSIONS.len() * PACKAGES,
        )
    }

    fn build(table: &[Option<usize>]) -> InMemoryRegistry {
        let mut registry = InMemoryRegistry::new();
        for package in 0..PACKAGES {
            for (index, version) in VERSIONS.iter().enumerate() {
                let names: Vec<String> = (0..PACKAGES).map(|p| format!("p{}", p)).collect();
                let dependencies: Vec<(&str, &str)> = ((package + 1)..PACKAGES)
                    .filter_map(|dep| {
                        let slot = (package * VERSIONS.len() + index) * PACKAGES + dep;
                        table[slot].map(|range| (names[dep].as_str(), RANGES[range]))
                    })
                    .collect();
                registry
                    .publish(&format!("p{}", package), version, &dependencies)
                    .unwrap();
            }
        }
        registry
    }

    fn run(registry: InMemoryRegistry) -> (ResolverResult<Resolution>, ConstraintRegistry) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let mut session = Session::new(registry, ResolveOptions::default());
        let result = runtime.block_on(session.resolve("p0", &Range::any()));
        (result, session.constraints().clone())
    }

    proptest! {
        #[test]
        fn resolution_is_valid_or_fails_cleanly(table in dependency_table()) {
            let (result, constraints) = run(build(&table));
            match result {
                Ok(resolution) => {
                    prop_assert!(resolution.assignment.get("p0").is_some());
                    prop_assert!(resolution
                        .assignment
                        .satisfies(|name| constraints.ranges_for(name)));
                    prop_assert_eq!(resolution.packages.len(), resolution.assignment.len());
                },
                Err(error) => {
                    prop_assert!(
                        matches!(
                            error,
                            BurrError::UnresolvableConflict { .. }
                                | BurrError::NoFeasibleVersion { .. }
                                | BurrError::NoCandidateVersion { .. }
                        ),
                        "unexpected error: {:?}",
                        error
                    );
                },
            }
        }

        #[test]
        fn resolution_is_deterministic(table in dependency_table()) {
            let (first, _) = run(build(&table));
            let (second, _) = run(build(&table));
            let first = first.map(|r| r.assignment).map_err(|e| e.to_string());
            let second = second.map(|r| r.assignment).map_err(|e| e.to_string());
            prop_assert_eq!(first, second);
        }
    }
}
