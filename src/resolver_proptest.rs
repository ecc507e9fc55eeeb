//! Property-based tests for version ordering and resolution.
//!
//! These tests use proptest to generate repository chains and version strings
//! and verify that the ordering and tie-break invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use std::cmp::Ordering;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use crate::access::ModuleRepository;
    use crate::memory::MemoryRepository;
    use crate::model::{Version, VersionSelector};
    use crate::policy::DefaultSelectionPolicy;
    use crate::resolver::{DynamicVersionResolver, Resolution};
    use proptest::prelude::*;

    type Chain = Vec<Arc<MemoryRepository>>;

    fn build(chain: &[(String, BTreeSet<u8>)]) -> (DynamicVersionResolver, Chain) {
        let mut resolver = DynamicVersionResolver::new(Arc::new(DefaultSelectionPolicy::new()));
        let mut repositories = Vec::new();
        for (name, minors) in chain {
            let versions: Vec<String> = minors.iter().map(|minor| format!("1.{}", minor)).collect();
            let versions: Vec<&str> = versions.iter().map(String::as_str).collect();
            let repository = Arc::new(
                MemoryRepository::new(name.as_str())
                    .local(|l| l.with_modules("g", "n", &versions))
                    .remote(|r| r.with_modules("g", "n", &["9.9"])),
            );
            let shared: Arc<dyn ModuleRepository> = repository.clone();
            resolver.add(shared);
            repositories.push(repository);
        }
        (resolver, repositories)
    }

    fn chain_strategy() -> impl Strategy<Value = Vec<(String, BTreeSet<u8>)>> {
        prop::collection::vec(prop::collection::btree_set(0u8..10, 1..4), 1..6).prop_map(|sets| {
            sets.into_iter()
                .enumerate()
                .map(|(i, set)| (format!("repo{}", i), set))
                .collect()
        })
    }

    /// The first repository in `chain` holding the newest version.
    fn expected_winner(chain: &[(String, BTreeSet<u8>)]) -> (String, String) {
        let newest = chain
            .iter()
            .filter_map(|(_, set)| set.iter().max())
            .max()
            .copied()
            .unwrap_or_default();
        let name = chain
            .iter()
            .find(|(_, set)| set.contains(&newest))
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        (name, format!("1.{}", newest))
    }

    // ============================================================================
    // Resolution property tests
    // ============================================================================

    proptest! {
        /// Property: the winning version does not depend on registration order;
        /// ties go to the earliest registered repository
        #[test]
        fn winner_is_order_independent_except_ties(chain in chain_strategy()) {
            let selector = VersionSelector::new("g", "n", "latest");
            let mut reversed = chain.clone();
            reversed.reverse();

            for order in [&chain, &reversed] {
                let (resolver, _) = build(order);
                let resolution = resolver.resolve(&selector).unwrap();
                let (repository, version) = expected_winner(order);
                prop_assert_eq!(&resolution.id().version, &version);
                prop_assert_eq!(&resolution.repository, &repository);
            }
        }

        /// Property: when every repository resolves locally, no remote tier is touched
        #[test]
        fn local_answers_never_reach_remote(chain in chain_strategy(), parallel in any::<bool>()) {
            let (resolver, repositories) = build(&chain);
            let resolver = resolver.with_parallel(parallel);
            let selector = VersionSelector::new("g", "n", "1.+");
            resolver.resolve(&selector).unwrap();
            for repository in &repositories {
                prop_assert_eq!(repository.remote_tier().total_calls(), 0);
                prop_assert_eq!(repository.local_tier().listing_calls(), 1);
            }
        }

        /// Property: parallel and sequential passes agree
        #[test]
        fn parallel_matches_sequential(chain in chain_strategy(), lower in 0u8..10) {
            let selector = VersionSelector::new("g", "n", format!("[1.{},)", lower));
            let (sequential, _) = build(&chain);
            let (parallel, _) = build(&chain);

            let outcome = |r: Resolution| (r.repository.clone(), r.id().clone());
            let sequential = sequential.resolve(&selector).map(outcome);
            let parallel = parallel.with_parallel(true).resolve(&selector).map(outcome);
            match (sequential, parallel) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
                (a, b) => {
                    prop_assert!(false, "outcomes differ: {:?} vs {:?}", a.is_ok(), b.is_ok())
                }
            }
        }
    }

    // ============================================================================
    // Version ordering property tests
    // ============================================================================

    fn version_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "v?[0-9]{1,2}(\\.[0-9]{1,2}){0,2}(-[a-z0-9]{1,4})?",
            "[a-z]{1,6}",
            "[0-9]{1,2}(\\.[0-9]{1,2}){3}",
        ]
    }

    proptest! {
        /// Property: comparison is antisymmetric and consistent with equality
        #[test]
        fn version_order_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
            let (va, vb) = (Version::parse(&a), Version::parse(&b));
            prop_assert_eq!(va.cmp(&vb), vb.cmp(&va).reverse());
            prop_assert_eq!(va.cmp(&vb) == Ordering::Equal, a == b);
        }

        /// Property: comparison is transitive
        #[test]
        fn version_order_is_transitive(
            a in version_strategy(),
            b in version_strategy(),
            c in version_strategy(),
        ) {
            let (va, vb, vc) = (Version::parse(&a), Version::parse(&b), Version::parse(&c));
            if va <= vb && vb <= vc {
                prop_assert!(va <= vc);
            }
            if va >= vb && vb >= vc {
                prop_assert!(va >= vc);
            }
        }

        /// Property: parseable versions always sort above unparseable ones
        #[test]
        fn parseable_versions_sort_above_unparseable(
            parseable in "[1-9][0-9]?\\.(0|[1-9][0-9]?)",
            word in "[a-z]{1,6}",
        ) {
            prop_assert!(Version::parse(&parseable) > Version::parse(&word));
        }
    }
}
