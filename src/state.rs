//! # Repository Resolution State
//!
//! Everything one resolution request knows about one repository. The state
//! can be resolved more than once (local pass, then remote pass); it keeps
//! its probes between passes so that no tier is ever consulted twice.
//!
//! ## Steps of `resolve`
//!
//! 1. Drive the version listing probe one tier further.
//! 2. Offer the listed versions to the selection policy as candidates. Each
//!    version string maps to exactly one `CandidateProbe`, created the first
//!    time the version is listed and reused afterwards.
//! 3. The policy reports back through the `SelectionContext` callbacks
//!    implemented here. Metadata is fetched for the first match that actually
//!    has metadata; later matches are only remembered.
//! 4. Adopt the chosen metadata, wrapped with every matching version when the
//!    selector matched more than one.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use log::{debug, warn};

use crate::access::{ListingState, MetadataOutcome, MetadataState, ModuleRepository};
use crate::attempts::AttemptLog;
use crate::candidate::CandidateProbe;
use crate::error::ResolveFailure;
use crate::listing::VersionListingProbe;
use crate::metadata::{ComponentMetadata, MultipleCandidateMetadata};
use crate::model::{ComponentId, VersionSelector};
use crate::selection::{Candidate, SelectionContext, VersionSelectionPolicy};

/// Per-repository resolution state for one request.
pub struct RepositoryResolveState {
    policy: Arc<dyn VersionSelectionPolicy>,
    selector: VersionSelector,
    repository: Arc<dyn ModuleRepository>,
    listing: VersionListingProbe,
    attempts: Arc<AttemptLog>,
    candidates: HashMap<String, Arc<CandidateProbe>>,
    matching_versions: Vec<String>,
    unmatched_versions: IndexSet<String>,
    rejected_versions: IndexSet<String>,
    selected: Option<Arc<dyn ComponentMetadata>>,
    resolved: MetadataOutcome,
}

impl RepositoryResolveState {
    pub fn new(
        policy: Arc<dyn VersionSelectionPolicy>,
        selector: VersionSelector,
        repository: Arc<dyn ModuleRepository>,
    ) -> Self {
        Self {
            listing: VersionListingProbe::new(selector.clone(), repository.clone()),
            policy,
            selector,
            repository,
            attempts: Arc::new(AttemptLog::new()),
            candidates: HashMap::new(),
            matching_versions: Vec::new(),
            unmatched_versions: IndexSet::new(),
            rejected_versions: IndexSet::new(),
            selected: None,
            resolved: MetadataOutcome::unknown(),
        }
    }

    pub fn repository(&self) -> &Arc<dyn ModuleRepository> {
        &self.repository
    }

    /// The outcome for this repository so far.
    pub fn outcome(&self) -> &MetadataState {
        &self.resolved.state
    }

    /// Every version reported as matching in the latest selection pass.
    pub fn matching_versions(&self) -> &[String] {
        &self.matching_versions
    }

    pub fn unmatched_versions(&self) -> &IndexSet<String> {
        &self.unmatched_versions
    }

    pub fn rejected_versions(&self) -> &IndexSet<String> {
        &self.rejected_versions
    }

    pub fn resolve(&mut self) {
        match self.listing.resolve() {
            ListingState::Failed(failure) => {
                self.resolved.state = MetadataState::Failed(failure);
            }
            ListingState::Listed(versions) => self.select_matching_version_and_resolve(&versions),
            ListingState::Unknown => {}
        }
    }

    /// Whether the listing still has an unattempted remote tier.
    pub fn can_make_further_attempts(&self) -> bool {
        self.listing.can_make_further_attempts()
    }

    /// Contributes this repository's diagnostics to the not-found report.
    pub fn apply_to(
        &self,
        attempted: &mut IndexSet<String>,
        unmatched: &mut IndexSet<String>,
        rejected: &mut IndexSet<String>,
    ) {
        self.listing.apply_to(attempted);
        self.attempts.apply_to(attempted);
        unmatched.extend(self.unmatched_versions.iter().cloned());
        rejected.extend(self.rejected_versions.iter().cloned());
    }

    fn select_matching_version_and_resolve(&mut self, versions: &[String]) {
        // A new listing supersedes the matches of the previous pass.
        self.matching_versions.clear();

        let candidates = self.candidates_for(versions);
        let views: Vec<&dyn Candidate> =
            candidates.iter().map(|c| &**c as &dyn Candidate).collect();
        let policy = Arc::clone(&self.policy);
        let selector = self.selector.clone();
        policy.select_newest_matching_component(&views, self, &selector);

        self.apply_resolution_result();
    }

    fn candidates_for(&mut self, versions: &[String]) -> Vec<Arc<CandidateProbe>> {
        versions
            .iter()
            .map(|version| Arc::clone(self.candidate(version)))
            .collect()
    }

    fn candidate(&mut self, version: &str) -> &Arc<CandidateProbe> {
        if !self.candidates.contains_key(version) {
            let probe = CandidateProbe::new(
                &self.selector,
                version,
                Arc::clone(&self.repository),
                Arc::clone(&self.attempts),
            );
            self.candidates.insert(version.to_string(), Arc::new(probe));
        }
        &self.candidates[version]
    }

    fn apply_resolution_result(&mut self) {
        let Some(selected) = &self.selected else {
            return;
        };
        let metadata: Arc<dyn ComponentMetadata> = if self.matching_versions.len() == 1 {
            Arc::clone(selected)
        } else {
            Arc::new(MultipleCandidateMetadata::new(
                self.matching_versions.clone(),
                Arc::clone(selected),
            ))
        };
        self.resolved.state = MetadataState::Resolved(metadata);
    }
}

impl SelectionContext for RepositoryResolveState {
    fn matches(&mut self, id: &ComponentId) {
        // Ranges report every version inside the range, best first. Only the
        // first one that has metadata is fetched; the others are remembered
        // so conflict resolution can intersect overlapping ranges later.
        self.matching_versions.push(id.version.clone());
        if self.selected.is_some() {
            return;
        }
        if !self.candidates.contains_key(&id.version) {
            warn!(
                "Selection policy matched {} which {} did not list",
                id,
                self.repository.name()
            );
        }
        let candidate = Arc::clone(self.candidate(&id.version));
        self.selected = candidate.try_resolve_metadata(&mut self.resolved);
        if self.selected.is_none() {
            debug!(
                "No metadata for matching version {} in {} ({})",
                id,
                self.repository.name(),
                self.resolved.state.name()
            );
        }
    }

    fn not_matched(&mut self, version: &str) {
        self.unmatched_versions.insert(version.to_string());
    }

    fn rejected(&mut self, version: &str) {
        self.rejected_versions.insert(version.to_string());
    }

    fn no_match_found(&mut self) {
        self.resolved.state = MetadataState::Missing;
    }

    fn failed(&mut self, failure: ResolveFailure) {
        self.resolved.state = MetadataState::Failed(failure);
    }
}
