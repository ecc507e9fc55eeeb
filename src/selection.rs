//! # Version Selection Contract
//!
//! The comparison and matching policy is a pluggable strategy. The engine
//! hands it the listed candidates together with a `SelectionContext`, and
//! the policy reports what it decided through the context's small, closed set
//! of callbacks:
//!
//! - `matches(id)` for each version that satisfies the selector, best first.
//!   Range selectors may report several matches.
//! - `not_matched(version)` for versions the selector excludes.
//! - `rejected(version)` for versions a rejection rule excludes even though
//!   the selector would accept them.
//! - `no_match_found()` when nothing matched, `failed(cause)` when the policy
//!   could not decide.

use crate::access::MetadataOutcome;
use crate::error::ResolveFailure;
use crate::metadata::ComponentMetadata;
use crate::model::{ComponentId, Version, VersionSelector};

/// Which of two components is the newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newest {
    First,
    Second,
}

/// A listed version offered to the policy. Metadata is fetched lazily and
/// only if the policy asks for it.
pub trait Candidate {
    fn id(&self) -> &ComponentId;

    fn version(&self) -> &Version;

    fn metadata(&self) -> MetadataOutcome;
}

/// Receives the policy's decisions for one repository.
pub trait SelectionContext {
    fn matches(&mut self, id: &ComponentId);

    fn not_matched(&mut self, version: &str);

    fn rejected(&mut self, version: &str);

    fn no_match_found(&mut self);

    fn failed(&mut self, failure: ResolveFailure);
}

/// Decides which versions satisfy a selector and which component is newest.
pub trait VersionSelectionPolicy: Send + Sync {
    /// Total, deterministic comparison of two resolved components.
    fn select_newest_component(
        &self,
        one: &dyn ComponentMetadata,
        two: &dyn ComponentMetadata,
    ) -> Newest;

    /// Walks `candidates` in best-first order and reports the outcome to
    /// `context`.
    fn select_newest_matching_component(
        &self,
        candidates: &[&dyn Candidate],
        context: &mut dyn SelectionContext,
        selector: &VersionSelector,
    );
}
