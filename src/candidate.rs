//! # Candidate Probe
//!
//! Memoized metadata fetch for one (dependency, version, repository) triple.
//! Range selectors can report the same version as a match several times; the
//! probe guarantees the underlying local and remote fetches each happen at
//! most once, and every caller observes the same state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::trace;

use crate::access::{
    ComponentOverrides, MetadataOutcome, MetadataState, ModuleRepository, RepositoryAccess,
};
use crate::attempts::AttemptLog;
use crate::metadata::ComponentMetadata;
use crate::model::{ComponentId, Version, VersionSelector};
use crate::selection::Candidate;

#[derive(Debug)]
struct CandidateProgress {
    result: MetadataOutcome,
    searched_locally: bool,
    searched_remotely: bool,
}

/// Lazily fetched metadata of one listed version.
pub struct CandidateProbe {
    id: ComponentId,
    version: Version,
    overrides: ComponentOverrides,
    repository: Arc<dyn ModuleRepository>,
    attempts: Arc<AttemptLog>,
    progress: Mutex<CandidateProgress>,
}

impl CandidateProbe {
    pub fn new(
        selector: &VersionSelector,
        version: &str,
        repository: Arc<dyn ModuleRepository>,
        attempts: Arc<AttemptLog>,
    ) -> Self {
        Self {
            id: ComponentId::for_selector(selector, version),
            version: Version::parse(version),
            overrides: ComponentOverrides::for_dependency(selector.with_version(version)),
            repository,
            attempts,
            progress: Mutex::new(CandidateProgress {
                result: MetadataOutcome::unknown(),
                searched_locally: false,
                searched_remotely: false,
            }),
        }
    }

    /// Returns the memoized outcome, fetching each tier only the first time
    /// it is needed.
    ///
    /// The local tier is consulted first; the remote tier is skipped when the
    /// local answer is authoritative, resolved or failed.
    pub fn resolve(&self) -> MetadataOutcome {
        let mut progress = self.lock();

        if !progress.searched_locally {
            progress.searched_locally = true;
            self.process(&mut progress, self.repository.local_access(), "local");
            if progress.result.has_result() && progress.result.authoritative {
                progress.searched_remotely = true;
            }
        }
        if progress.result.is_conclusive() {
            return progress.result.clone();
        }
        if !progress.searched_remotely {
            progress.searched_remotely = true;
            self.process(&mut progress, self.repository.remote_access(), "remote");
        }

        progress.result.clone()
    }

    /// Resolves, then returns the metadata if there is any.
    ///
    /// A missing version copies its attempted locations into `target` and
    /// marks it missing; a failure is copied into `target`. Neither is an
    /// error for the caller: both are expected negative answers.
    pub fn try_resolve_metadata(
        &self,
        target: &mut MetadataOutcome,
    ) -> Option<Arc<dyn ComponentMetadata>> {
        let result = self.resolve();
        match result.state {
            MetadataState::Resolved(metadata) => Some(metadata),
            MetadataState::Missing => {
                target.attempted.extend(result.attempted);
                target.state = MetadataState::Missing;
                None
            }
            MetadataState::Failed(failure) => {
                target.state = MetadataState::Failed(failure);
                None
            }
            MetadataState::Unknown => None,
        }
    }

    fn process(&self, progress: &mut CandidateProgress, access: &dyn RepositoryAccess, tier: &str) {
        trace!(
            "Fetching metadata of {} from {} ({})",
            self.id,
            self.repository.name(),
            tier
        );
        let outcome = access.resolve_metadata(&self.id, &self.overrides);
        self.attempts.record(outcome.attempted.iter().cloned());
        progress.result.absorb(outcome);
    }

    fn lock(&self) -> MutexGuard<'_, CandidateProgress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Candidate for CandidateProbe {
    fn id(&self) -> &ComponentId {
        &self.id
    }

    fn version(&self) -> &Version {
        &self.version
    }

    fn metadata(&self) -> MetadataOutcome {
        self.resolve()
    }
}
