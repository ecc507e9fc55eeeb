//! # Version Listing Probe
//!
//! Memoized "what versions exist" query for one (dependency, repository)
//! pair. Over its lifetime a probe performs at most one local and at most one
//! remote listing.
//!
//! ## Tier progression
//!
//! The first `resolve` lists the local tier. If that produced any result, the
//! call returns without touching the remote tier, and an authoritative local
//! result cancels the remote tier for good. Only when the local tier had
//! nothing at all to say does the same call fall through to the remote tier.
//! A later `resolve` performs the remote listing if it is still outstanding.
//!
//! Returning after a non-authoritative local result lets the orchestrator
//! batch every repository's local lookups before any of them pays for a
//! remote call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexSet;
use log::trace;

use crate::access::{ListingOutcome, ListingState, ModuleRepository, RepositoryAccess};
use crate::model::VersionSelector;

#[derive(Debug)]
struct ListingProgress {
    result: ListingOutcome,
    searched_locally: bool,
    searched_remotely: bool,
}

/// Per-repository enumeration of the versions of one module.
pub struct VersionListingProbe {
    selector: VersionSelector,
    repository: Arc<dyn ModuleRepository>,
    progress: Mutex<ListingProgress>,
}

impl VersionListingProbe {
    pub fn new(selector: VersionSelector, repository: Arc<dyn ModuleRepository>) -> Self {
        Self {
            selector,
            repository,
            progress: Mutex::new(ListingProgress {
                result: ListingOutcome::unknown(),
                searched_locally: false,
                searched_remotely: false,
            }),
        }
    }

    /// Advances by at most the one tier needed and returns the current state.
    ///
    /// The lock is held across the access call, so concurrent callers never
    /// trigger a second access of the same tier.
    pub fn resolve(&self) -> ListingState {
        let mut progress = self.lock();

        if !progress.searched_locally {
            progress.searched_locally = true;
            self.process(&mut progress, self.repository.local_access(), "local");
            if progress.result.has_result() {
                if progress.result.authoritative {
                    progress.searched_remotely = true;
                }
                return progress.result.state.clone();
            }
        }

        if !progress.searched_remotely {
            progress.searched_remotely = true;
            self.process(&mut progress, self.repository.remote_access(), "remote");
        }

        progress.result.state.clone()
    }

    /// The memoized state, without making progress.
    pub fn state(&self) -> ListingState {
        self.lock().result.state.clone()
    }

    /// Whether a remote listing is still outstanding.
    pub fn can_make_further_attempts(&self) -> bool {
        !self.lock().searched_remotely
    }

    /// Copies the locations consulted so far into `target`.
    pub fn apply_to(&self, target: &mut IndexSet<String>) {
        target.extend(self.lock().result.attempted.iter().cloned());
    }

    fn process(&self, progress: &mut ListingProgress, access: &dyn RepositoryAccess, tier: &str) {
        trace!(
            "Listing versions of {} in {} ({})",
            self.selector.module(),
            self.repository.name(),
            tier
        );
        let outcome = access.list_versions(&self.selector);
        progress.result.absorb(outcome);
    }

    fn lock(&self) -> MutexGuard<'_, ListingProgress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessTier;
    use crate::memory::MemoryRepository;

    fn selector() -> VersionSelector {
        VersionSelector::new("g", "n", "latest")
    }

    fn probe(repo: &Arc<MemoryRepository>) -> VersionListingProbe {
        VersionListingProbe::new(selector(), repo.clone())
    }

    #[test]
    fn test_authoritative_local_listing_skips_remote() {
        let repo = Arc::new(
            MemoryRepository::new("r")
                .local(|l| l.authoritative(true).with_versions("g", "n", &["1.0"]))
                .remote(|r| r.with_versions("g", "n", &["1.0", "2.0"])),
        );
        let probe = probe(&repo);

        assert_eq!(
            probe.resolve(),
            ListingState::Listed(vec!["1.0".to_string()])
        );
        assert!(!probe.can_make_further_attempts());
        probe.resolve();
        assert_eq!(repo.remote_tier().listing_calls(), 0);
        assert_eq!(repo.local_tier().listing_calls(), 1);
    }

    #[test]
    fn test_non_authoritative_local_listing_defers_remote() {
        let repo = Arc::new(
            MemoryRepository::new("r")
                .local(|l| l.with_versions("g", "n", &["1.0"]))
                .remote(|r| r.with_versions("g", "n", &["1.0", "2.0"])),
        );
        let probe = probe(&repo);

        assert_eq!(
            probe.resolve(),
            ListingState::Listed(vec!["1.0".to_string()])
        );
        assert_eq!(repo.remote_tier().listing_calls(), 0);
        assert!(probe.can_make_further_attempts());

        assert_eq!(
            probe.resolve(),
            ListingState::Listed(vec!["1.0".to_string(), "2.0".to_string()])
        );
        assert_eq!(repo.remote_tier().listing_calls(), 1);
        assert!(!probe.can_make_further_attempts());

        probe.resolve();
        assert_eq!(repo.local_tier().listing_calls(), 1);
        assert_eq!(repo.remote_tier().listing_calls(), 1);
    }

    #[test]
    fn test_silent_local_tier_falls_through_in_same_call() {
        let repo = Arc::new(
            MemoryRepository::new("r")
                .remote(|r| r.with_versions("g", "n", &["3.0"])),
        );
        let probe = probe(&repo);

        assert_eq!(
            probe.resolve(),
            ListingState::Listed(vec!["3.0".to_string()])
        );
        assert_eq!(repo.local_tier().listing_calls(), 1);
        assert_eq!(repo.remote_tier().listing_calls(), 1);
        assert!(!probe.can_make_further_attempts());
    }

    #[test]
    fn test_local_failure_is_a_result() {
        let repo = Arc::new(
            MemoryRepository::new("r")
                .local(|l| l.with_listing_failure("g", "n", "corrupt cache"))
                .remote(|r| r.with_versions("g", "n", &["1.0"])),
        );
        let probe = probe(&repo);

        match probe.resolve() {
            ListingState::Failed(failure) => assert!(failure.to_string().contains("corrupt cache")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(repo.remote_tier().listing_calls(), 0);
        assert!(matches!(probe.state(), ListingState::Failed(_)));
    }

    #[test]
    fn test_attempted_locations_accumulate_across_tiers() {
        let repo = Arc::new(
            MemoryRepository::new("r")
                .local(|l| l.with_versions("g", "n", &["1.0"]))
                .remote(|r| r.with_versions("g", "n", &["1.0"])),
        );
        let probe = probe(&repo);
        probe.resolve();
        probe.resolve();

        let mut attempted = IndexSet::new();
        probe.apply_to(&mut attempted);
        let attempted: Vec<String> = attempted.into_iter().collect();
        assert_eq!(
            attempted,
            vec![
                format!("memory://r/{}/g:n", AccessTier::Local),
                format!("memory://r/{}/g:n", AccessTier::Remote),
            ]
        );
    }

    #[test]
    fn test_concurrent_resolves_access_each_tier_once() {
        let repo = Arc::new(
            MemoryRepository::new("r")
                .local(|l| l.with_versions("g", "n", &["1.0"]))
                .remote(|r| r.with_versions("g", "n", &["1.0", "2.0"])),
        );
        let probe = probe(&repo);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    probe.resolve();
                });
            }
        });

        assert_eq!(repo.local_tier().listing_calls(), 1);
        assert_eq!(repo.remote_tier().listing_calls(), 1);
    }
}
