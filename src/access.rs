//! # Repository Access Contract
//!
//! This module defines the boundary between the resolution engine and the
//! repositories it queries. A repository exposes two tiers, local then
//! remote, through the same `RepositoryAccess` trait:
//!
//! - **`list_versions`**: what versions of a module does this tier know?
//! - **`resolve_metadata`**: what is the metadata of one specific version?
//!
//! Each answer is an outcome carrying a state, an *authoritative* flag (no
//! other tier can change the answer) and the locations that were consulted.
//! Failures are part of the outcome rather than an `Err`: a failing tier must
//! never abort the resolution of other repositories.

use std::fmt;
use std::sync::Arc;

use crate::error::ResolveFailure;
use crate::metadata::ComponentMetadata;
use crate::model::{ComponentId, VersionSelector};

/// Result state of a version listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingState {
    /// The tier had nothing to say.
    Unknown,
    /// Versions known to the tier, in the order the tier reported them.
    Listed(Vec<String>),
    Failed(ResolveFailure),
}

/// Outcome of one `list_versions` call, or the memoized outcome of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingOutcome {
    pub state: ListingState,
    pub authoritative: bool,
    pub attempted: Vec<String>,
}

impl ListingOutcome {
    pub fn unknown() -> Self {
        Self {
            state: ListingState::Unknown,
            authoritative: false,
            attempted: Vec::new(),
        }
    }

    pub fn listed<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: ListingState::Listed(versions.into_iter().map(Into::into).collect()),
            ..Self::unknown()
        }
    }

    pub fn failed(failure: ResolveFailure) -> Self {
        Self {
            state: ListingState::Failed(failure),
            ..Self::unknown()
        }
    }

    pub fn authoritative(mut self, authoritative: bool) -> Self {
        self.authoritative = authoritative;
        self
    }

    pub fn attempted(mut self, location: impl Into<String>) -> Self {
        self.attempted.push(location.into());
        self
    }

    pub fn has_result(&self) -> bool {
        !matches!(self.state, ListingState::Unknown)
    }

    /// Folds the outcome of a further tier into this one.
    ///
    /// A tier that had nothing to say leaves the previous state in place;
    /// attempted locations always accumulate.
    pub fn absorb(&mut self, next: ListingOutcome) {
        if next.has_result() {
            self.state = next.state;
            self.authoritative = next.authoritative;
        }
        self.attempted.extend(next.attempted);
    }
}

/// Result state of a metadata fetch.
#[derive(Debug, Clone)]
pub enum MetadataState {
    /// No answer yet.
    Unknown,
    Resolved(Arc<dyn ComponentMetadata>),
    /// The version does not exist in this tier.
    Missing,
    Failed(ResolveFailure),
}

impl MetadataState {
    pub fn name(&self) -> &'static str {
        match self {
            MetadataState::Unknown => "unknown",
            MetadataState::Resolved(_) => "resolved",
            MetadataState::Missing => "missing",
            MetadataState::Failed(_) => "failed",
        }
    }
}

/// Outcome of one `resolve_metadata` call, or the memoized outcome of a
/// probe. Also used as the per-repository probe state.
#[derive(Debug, Clone)]
pub struct MetadataOutcome {
    pub state: MetadataState,
    pub authoritative: bool,
    pub attempted: Vec<String>,
}

impl MetadataOutcome {
    pub fn unknown() -> Self {
        Self {
            state: MetadataState::Unknown,
            authoritative: false,
            attempted: Vec::new(),
        }
    }

    pub fn resolved(metadata: Arc<dyn ComponentMetadata>) -> Self {
        Self {
            state: MetadataState::Resolved(metadata),
            ..Self::unknown()
        }
    }

    pub fn missing() -> Self {
        Self {
            state: MetadataState::Missing,
            ..Self::unknown()
        }
    }

    pub fn failed(failure: ResolveFailure) -> Self {
        Self {
            state: MetadataState::Failed(failure),
            ..Self::unknown()
        }
    }

    pub fn authoritative(mut self, authoritative: bool) -> Self {
        self.authoritative = authoritative;
        self
    }

    pub fn attempted(mut self, location: impl Into<String>) -> Self {
        self.attempted.push(location.into());
        self
    }

    pub fn has_result(&self) -> bool {
        !matches!(self.state, MetadataState::Unknown)
    }

    /// Resolved or failed: no further tier can improve the answer.
    pub fn is_conclusive(&self) -> bool {
        matches!(
            self.state,
            MetadataState::Resolved(_) | MetadataState::Failed(_)
        )
    }

    /// Folds the outcome of a further tier into this one. See
    /// [`ListingOutcome::absorb`].
    pub fn absorb(&mut self, next: MetadataOutcome) {
        if next.has_result() {
            self.state = next.state;
            self.authoritative = next.authoritative;
        }
        self.attempted.extend(next.attempted);
    }

    pub fn metadata(&self) -> Option<&Arc<dyn ComponentMetadata>> {
        match &self.state {
            MetadataState::Resolved(metadata) => Some(metadata),
            _ => None,
        }
    }
}

/// Per-dependency overrides passed along with a metadata request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentOverrides {
    /// The original dependency, pinned to the candidate version.
    pub requested: VersionSelector,
}

impl ComponentOverrides {
    pub fn for_dependency(requested: VersionSelector) -> Self {
        Self { requested }
    }
}

/// One tier of a repository.
pub trait RepositoryAccess: Send + Sync {
    /// Lists the versions of the selected module known to this tier.
    fn list_versions(&self, selector: &VersionSelector) -> ListingOutcome;

    /// Fetches the metadata of one concrete version.
    fn resolve_metadata(
        &self,
        id: &ComponentId,
        overrides: &ComponentOverrides,
    ) -> MetadataOutcome;
}

/// A named repository with a local and a remote tier.
pub trait ModuleRepository: Send + Sync {
    fn name(&self) -> &str;

    fn local_access(&self) -> &dyn RepositoryAccess;

    fn remote_access(&self) -> &dyn RepositoryAccess;
}

impl fmt::Debug for dyn ModuleRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRepository")
            .field("name", &self.name())
            .finish()
    }
}
