//! # Resolution Orchestrator
//!
//! Resolves one dynamic version selector against an ordered list of
//! repositories.
//!
//! ## Passes
//!
//! Resolution runs at most two passes over the repositories, in registration
//! order:
//!
//! 1. Every repository is resolved once. For most repositories this only
//!    touches the local tier. Failures are recorded and the remaining
//!    repositories still run. Repositories that found nothing yet but still
//!    have a remote tier are deferred.
//! 2. Only when pass 1 produced no winner are the deferred repositories
//!    resolved again, which now performs their remote tiers.
//!
//! Every pass drains its whole queue before deciding, because a later
//! repository may hold a strictly newer match. Winners are reduced pairwise
//! with the policy's `select_newest_component`, in registration order, so on
//! a tie the earliest registered repository wins.
//!
//! A winner makes every recorded failure irrelevant; the failures are logged
//! and dropped. Without a winner, recorded failures become
//! `Error::ResolutionFailed`, and otherwise the request ends in
//! `Error::NotFound` carrying the diagnostics of every repository.

use std::sync::Arc;

use indexmap::IndexSet;
use log::debug;
use rayon::prelude::*;

use crate::access::{MetadataState, ModuleRepository};
use crate::error::{Error, ResolveFailure, Result};
use crate::metadata::ComponentMetadata;
use crate::model::{ComponentId, VersionSelector};
use crate::selection::{Newest, VersionSelectionPolicy};
use crate::state::RepositoryResolveState;

/// The successful outcome of a resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Name of the repository the winner came from.
    pub repository: String,
    /// The chosen metadata; wrapped when the selector matched several
    /// versions.
    pub metadata: Arc<dyn ComponentMetadata>,
}

impl Resolution {
    pub fn id(&self) -> &ComponentId {
        self.metadata.id()
    }

    /// Every version of the winning repository that matched the selector,
    /// best first. `None` when only the chosen version matched.
    pub fn all_versions(&self) -> Option<&[String]> {
        self.metadata.all_versions()
    }
}

struct Winner {
    index: usize,
    metadata: Arc<dyn ComponentMetadata>,
}

/// Two-pass resolution over an ordered list of repositories.
pub struct DynamicVersionResolver {
    policy: Arc<dyn VersionSelectionPolicy>,
    repositories: Vec<Arc<dyn ModuleRepository>>,
    parallel: bool,
}

impl DynamicVersionResolver {
    pub fn new(policy: Arc<dyn VersionSelectionPolicy>) -> Self {
        Self {
            policy,
            repositories: Vec::new(),
            parallel: false,
        }
    }

    /// Registers a repository. Registration order breaks ties.
    pub fn add(&mut self, repository: Arc<dyn ModuleRepository>) {
        self.repositories.push(repository);
    }

    /// Resolves the repositories of one pass concurrently.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn repositories(&self) -> &[Arc<dyn ModuleRepository>] {
        &self.repositories
    }

    pub fn repository_names(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.name()).collect()
    }

    pub fn resolve(&self, selector: &VersionSelector) -> Result<Resolution> {
        debug!(
            "Attempting to resolve version for {} using repositories {:?}",
            selector,
            self.repository_names()
        );

        let mut states: Vec<RepositoryResolveState> = self
            .repositories
            .iter()
            .map(|repository| {
                RepositoryResolveState::new(
                    Arc::clone(&self.policy),
                    selector.clone(),
                    Arc::clone(repository),
                )
            })
            .collect();
        let mut failures = Vec::new();

        let queue: Vec<usize> = (0..states.len()).collect();
        let (mut winner, deferred) = self.find_latest_module(&mut states, &queue, &mut failures);
        if winner.is_none() && !deferred.is_empty() {
            debug!(
                "No local match for {}; retrying {} repositories remotely",
                selector,
                deferred.len()
            );
            winner = self.find_latest_module(&mut states, &deferred, &mut failures).0;
        }

        if let Some(winner) = winner {
            for failure in &failures {
                debug!("Discarding resolve failure: {}", failure);
            }
            let repository = states[winner.index].repository().name().to_string();
            debug!("Using {} from {}", winner.metadata.id(), repository);
            return Ok(Resolution {
                repository,
                metadata: winner.metadata,
            });
        }

        if !failures.is_empty() {
            return Err(Error::ResolutionFailed {
                selector: selector.to_string(),
                causes: failures,
            });
        }

        let mut attempted = IndexSet::new();
        let mut unmatched = IndexSet::new();
        let mut rejected = IndexSet::new();
        for state in &states {
            state.apply_to(&mut attempted, &mut unmatched, &mut rejected);
        }
        Err(Error::NotFound {
            selector: selector.to_string(),
            attempted: attempted.into_iter().collect(),
            unmatched: unmatched.into_iter().collect(),
            rejected: rejected.into_iter().collect(),
        })
    }

    /// Drains `queue`, then classifies every resolved state in registration
    /// order. Returns the pass winner and the states worth retrying.
    fn find_latest_module(
        &self,
        states: &mut [RepositoryResolveState],
        queue: &[usize],
        failures: &mut Vec<ResolveFailure>,
    ) -> (Option<Winner>, Vec<usize>) {
        if self.parallel {
            let mut pending = vec![false; states.len()];
            for &index in queue {
                pending[index] = true;
            }
            states
                .par_iter_mut()
                .zip(pending.par_iter())
                .filter(|(_, pending)| **pending)
                .for_each(|(state, _)| state.resolve());
        } else {
            for &index in queue {
                states[index].resolve();
            }
        }

        let mut winner: Option<Winner> = None;
        let mut deferred = Vec::new();
        for &index in queue {
            let state = &states[index];
            match state.outcome() {
                MetadataState::Failed(failure) => failures.push(failure.clone()),
                MetadataState::Missing | MetadataState::Unknown => {
                    if state.can_make_further_attempts() {
                        deferred.push(index);
                    }
                }
                MetadataState::Resolved(metadata) => {
                    winner = Some(self.choose_best(winner, index, Arc::clone(metadata)));
                }
            }
        }
        (winner, deferred)
    }

    fn choose_best(
        &self,
        best: Option<Winner>,
        index: usize,
        metadata: Arc<dyn ComponentMetadata>,
    ) -> Winner {
        let Some(best) = best else {
            return Winner { index, metadata };
        };
        match self
            .policy
            .select_newest_component(best.metadata.as_ref(), metadata.as_ref())
        {
            Newest::First => best,
            Newest::Second => Winner { index, metadata },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessTier;
    use crate::memory::MemoryRepository;
    use crate::policy::DefaultSelectionPolicy;

    fn resolver(repositories: &[&Arc<MemoryRepository>]) -> DynamicVersionResolver {
        let mut resolver = DynamicVersionResolver::new(Arc::new(DefaultSelectionPolicy::new()));
        for repository in repositories {
            let repository: Arc<dyn ModuleRepository> = (*repository).clone();
            resolver.add(repository);
        }
        resolver
    }

    fn selector(version: &str) -> VersionSelector {
        VersionSelector::new("g", "n", version)
    }

    fn local_only(name: &str, versions: &[&str]) -> Arc<MemoryRepository> {
        Arc::new(MemoryRepository::new(name).local(|l| {
            l.authoritative(true).with_modules("g", "n", versions)
        }))
    }

    fn failing(name: &str, message: &str) -> Arc<MemoryRepository> {
        Arc::new(MemoryRepository::new(name).local(|l| {
            l.with_listing_failure("g", "n", message)
        }))
    }

    fn winning_repository(repositories: &[&Arc<MemoryRepository>], version: &str) -> String {
        let resolution = resolver(repositories).resolve(&selector(version));
        resolution.unwrap().repository
    }

    #[test]
    fn test_newest_match_across_repositories_wins() {
        let a = local_only("a", &["1.0", "1.5"]);
        let b = local_only("b", &["2.0"]);

        let resolution = resolver(&[&a, &b]).resolve(&selector("latest")).unwrap();
        assert_eq!(resolution.repository, "b");
        assert_eq!(resolution.id().version, "2.0");

        let resolution = resolver(&[&b, &a]).resolve(&selector("latest")).unwrap();
        assert_eq!(resolution.repository, "b");
    }

    #[test]
    fn test_tie_goes_to_earliest_registered_repository() {
        let a = local_only("a", &["2.0"]);
        let b = local_only("b", &["2.0"]);

        assert_eq!(winning_repository(&[&a, &b], "2.0"), "a");
        assert_eq!(winning_repository(&[&b, &a], "2.0"), "b");
    }

    #[test]
    fn test_authoritative_local_listing_never_reaches_remote() {
        let a = Arc::new(
            MemoryRepository::new("a")
                .local(|l| l.authoritative(true).with_modules("g", "n", &["1.0"]))
                .remote(|r| r.with_modules("g", "n", &["1.0", "2.0"])),
        );

        let error = resolver(&[&a]).resolve(&selector("2.0")).unwrap_err();
        assert!(matches!(error, Error::NotFound { .. }));
        assert_eq!(a.remote_tier().total_calls(), 0);
    }

    #[test]
    fn test_pass_one_winner_skips_deferred_remote_tiers() {
        let deferred = Arc::new(
            MemoryRepository::new("deferred")
                .local(|l| l.with_modules("g", "n", &["2.0"]))
                .remote(|r| r.with_modules("g", "n", &["1.9"])),
        );
        let winner = local_only("winner", &["1.0"]);

        assert_eq!(winning_repository(&[&deferred, &winner], "1.+"), "winner");
        assert_eq!(deferred.local_tier().listing_calls(), 1);
        assert_eq!(deferred.remote_tier().total_calls(), 0);
    }

    #[test]
    fn test_pass_two_uses_remote_tier() {
        let a = Arc::new(
            MemoryRepository::new("a")
                .local(|l| l.with_modules("g", "n", &["1.0"]))
                .remote(|r| r.with_modules("g", "n", &["1.0", "2.0"])),
        );

        let resolution = resolver(&[&a]).resolve(&selector("2.0")).unwrap();
        assert_eq!(resolution.id().version, "2.0");
        assert_eq!(
            resolution.metadata.source().map(|s| s.tier),
            Some(AccessTier::Remote)
        );
        assert_eq!(a.local_tier().listing_calls(), 1);
        assert_eq!(a.remote_tier().listing_calls(), 1);
    }

    #[test]
    fn test_failure_discarded_when_another_repository_wins() {
        testing_logger::setup();
        let broken = failing("broken", "cache corrupted");
        let good = Arc::new(
            MemoryRepository::new("good")
                .local(|l| l.with_modules("g", "n", &["1.0"])),
        );

        assert_eq!(winning_repository(&[&broken, &good], "latest"), "good");
        assert_eq!(broken.remote_tier().total_calls(), 0);

        testing_logger::validate(|logs| {
            assert!(logs.iter().any(|entry| entry.level == log::Level::Debug
                && entry.body.starts_with("Discarding resolve failure")
                && entry.body.contains("cache corrupted")));
            assert!(logs
                .iter()
                .any(|entry| entry.body == "Using g:n:1.0 from good"));
        });
    }

    #[test]
    fn test_failures_are_aggregated_without_winner() {
        let a = failing("a", "timeout");
        let b = failing("b", "refused");
        let c = local_only("c", &["0.1"]);

        match resolver(&[&a, &b, &c]).resolve(&selector("1.0")) {
            Err(Error::ResolutionFailed { selector, causes }) => {
                assert_eq!(selector, "g:n:1.0");
                assert_eq!(causes.len(), 2);
                assert!(causes[0].to_string().contains("timeout"));
                assert!(causes[1].to_string().contains("refused"));
            }
            other => panic!(
                "expected aggregated failure, got {:?}",
                other.map(|r| r.repository)
            ),
        }
    }

    #[test]
    fn test_not_found_merges_every_repository_diagnostics() {
        let a = local_only("a", &["1.0", "1.1"]);
        let b = local_only("b", &["0.9", "1.1"]);

        match resolver(&[&a, &b]).resolve(&selector("[2.0,3.0)")) {
            Err(Error::NotFound {
                attempted,
                unmatched,
                rejected,
                ..
            }) => {
                assert_eq!(unmatched, vec!["1.1", "1.0", "0.9"]);
                assert!(rejected.is_empty());
                assert_eq!(
                    attempted,
                    vec!["memory://a/local/g:n", "memory://b/local/g:n"]
                );
            }
            other => panic!("expected not found, got {:?}", other.map(|r| r.repository)),
        }
    }

    #[test]
    fn test_range_resolution_carries_matching_versions() {
        let a = Arc::new(MemoryRepository::new("a").local(|l| {
            l.authoritative(true)
                .with_versions("g", "n", &["5", "6", "7", "8"])
                .with_module("g", "n", "5")
                .with_module("g", "n", "7")
        }));

        let resolution = resolver(&[&a]).resolve(&selector("[5,8]")).unwrap();
        assert_eq!(resolution.id().version, "7");
        assert_eq!(resolution.all_versions().unwrap(), &["8", "7", "6", "5"]);
    }

    #[test]
    fn test_invalid_selector_is_a_resolution_failure() {
        let a = local_only("a", &["1.0"]);
        match resolver(&[&a]).resolve(&selector("[3.0,1.0]")) {
            Err(Error::ResolutionFailed { causes, .. }) => {
                assert!(matches!(causes[0], ResolveFailure::Selection { .. }));
            }
            other => panic!(
                "expected selection failure, got {:?}",
                other.map(|r| r.repository)
            ),
        }
    }

    #[test]
    fn test_no_repositories_is_not_found() {
        let error = DynamicVersionResolver::new(Arc::new(DefaultSelectionPolicy::new()))
            .resolve(&selector("latest"))
            .unwrap_err();
        assert!(error.to_string().contains("No locations were searched."));
    }

    #[test]
    fn test_parallel_pass_matches_sequential_outcome() {
        let build = || -> Vec<Arc<MemoryRepository>> {
            (0..8)
                .map(|i| {
                    let name = format!("r{}", i);
                    let version = format!("1.{}", i % 3);
                    Arc::new(
                        MemoryRepository::new(name)
                            .local(|l| l.with_versions("g", "n", &["0.1"]))
                            .remote(|r| r.with_modules("g", "n", &["0.1", version.as_str()])),
                    )
                })
                .collect()
        };

        let sequential_repos = build();
        let parallel_repos = build();
        let sequential = resolver(&sequential_repos.iter().collect::<Vec<_>>())
            .resolve(&selector("1.+"))
            .unwrap();
        let parallel = resolver(&parallel_repos.iter().collect::<Vec<_>>())
            .with_parallel(true)
            .resolve(&selector("1.+"))
            .unwrap();

        assert_eq!(sequential.repository, "r2");
        assert_eq!(parallel.repository, sequential.repository);
        assert_eq!(parallel.id(), sequential.id());
        for repo in &parallel_repos {
            assert_eq!(repo.local_tier().listing_calls(), 1);
            assert_eq!(repo.remote_tier().listing_calls(), 1);
        }
    }
}
