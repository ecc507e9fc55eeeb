//! # Default Selection Policy
//!
//! A `VersionSelectionPolicy` that understands the selector forms most build
//! files use:
//!
//! | Selector | Meaning | Matches reported |
//! |---|---|---|
//! | `latest`, `+` | newest listed version | one |
//! | `latest.<status>` | newest version whose status is at least `<status>` | one |
//! | `1.2.+` | versions starting with `1.2.` | all |
//! | `[1.0,2.0)`, `]1.0,2.0[`, `(,2.0]`, `[1.0,)` | bounded range | all |
//! | anything else | that exact version | one |
//!
//! Candidates are walked newest first. Versions that satisfy the selector
//! but match one of the configured `reject` globs are reported as rejected
//! rather than matched.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::access::MetadataState;
use crate::error::{Error, ResolveFailure, Result};
use crate::metadata::ComponentMetadata;
use crate::model::{Version, VersionSelector};
use crate::selection::{Candidate, Newest, SelectionContext, VersionSelectionPolicy};

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\[\]\(])\s*([^,\s\[\]\(\)]*)\s*,\s*([^,\s\[\]\(\)]*)\s*([\[\]\)])$")
        .expect("range pattern is valid")
});

/// Rejection rules applied on top of selector matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRules {
    /// Glob patterns; a matching version is rejected.
    #[serde(default)]
    pub reject: Vec<String>,
}

/// One end of a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

impl Bound {
    /// Whether `version` lies on the `side` of this bound, or on it when the
    /// bound is inclusive.
    fn admits(&self, version: &Version, side: Ordering) -> bool {
        match version.semantic_cmp(&self.version) {
            Ordering::Equal => self.inclusive,
            ordering => ordering == side,
        }
    }
}

/// A parsed version selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMatcher {
    Latest { status: Option<String> },
    Prefix(String),
    Range {
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
    Exact(String),
}

impl VersionMatcher {
    pub fn parse(selector: &str) -> Result<Self> {
        let selector = selector.trim();
        let invalid = |message: &str| Error::InvalidSelector {
            selector: selector.to_string(),
            message: message.to_string(),
        };

        if selector.is_empty() {
            return Err(invalid("selector is empty"));
        }
        if selector == "latest" || selector == "+" {
            return Ok(VersionMatcher::Latest { status: None });
        }
        if let Some(status) = selector.strip_prefix("latest.") {
            if status.is_empty() {
                return Err(invalid("missing status after 'latest.'"));
            }
            return Ok(VersionMatcher::Latest {
                status: Some(status.to_string()),
            });
        }
        if let Some(prefix) = selector.strip_suffix('+') {
            return Ok(VersionMatcher::Prefix(prefix.to_string()));
        }
        if selector.starts_with(['[', ']', '(']) {
            return Self::parse_range(selector)
                .ok_or_else(|| invalid("malformed version range"));
        }
        if selector.contains(|c: char| c.is_whitespace() || c == ',') {
            return Err(invalid("unexpected ',' or whitespace"));
        }
        Ok(VersionMatcher::Exact(selector.to_string()))
    }

    fn parse_range(selector: &str) -> Option<Self> {
        let captures = RANGE.captures(selector)?;
        let bound = |text: &str, inclusive: bool| {
            (!text.is_empty()).then(|| Bound {
                version: Version::parse(text),
                inclusive,
            })
        };
        let lower = bound(&captures[2], &captures[1] == "[");
        let upper = bound(&captures[3], &captures[4] == "]");

        if let (Some(lower), Some(upper)) = (&lower, &upper) {
            if lower.version.semantic_cmp(&upper.version) == Ordering::Greater {
                return None;
            }
        }
        Some(VersionMatcher::Range { lower, upper })
    }

    /// Whether the walk stops at the first match.
    pub fn matches_unique_version(&self) -> bool {
        matches!(
            self,
            VersionMatcher::Latest { .. } | VersionMatcher::Exact(_)
        )
    }

    /// Whether deciding a match needs the candidate's metadata.
    pub fn needs_metadata(&self) -> bool {
        matches!(self, VersionMatcher::Latest { status: Some(_) })
    }

    pub fn accept(&self, version: &Version) -> bool {
        match self {
            VersionMatcher::Latest { .. } => true,
            VersionMatcher::Prefix(prefix) => version.source().starts_with(prefix.as_str()),
            VersionMatcher::Range { lower, upper } => {
                let above = lower
                    .as_ref()
                    .is_none_or(|bound| bound.admits(version, Ordering::Greater));
                let below = upper
                    .as_ref()
                    .is_none_or(|bound| bound.admits(version, Ordering::Less));
                above && below
            }
            VersionMatcher::Exact(exact) => version.source() == exact,
        }
    }

    /// Status check for `latest.<status>`; always true for other selectors.
    pub fn accept_metadata(&self, metadata: &dyn ComponentMetadata) -> bool {
        let VersionMatcher::Latest {
            status: Some(wanted),
        } = self
        else {
            return true;
        };
        let scheme = metadata.status_scheme();
        let rank = |status: &str| scheme.iter().position(|s| s == status);
        match (rank(metadata.status()), rank(wanted)) {
            (Some(actual), Some(wanted)) => actual >= wanted,
            _ => false,
        }
    }
}

/// Semantic-version based selection with glob rejection rules.
#[derive(Debug, Clone, Default)]
pub struct DefaultSelectionPolicy {
    reject: Vec<glob::Pattern>,
}

impl DefaultSelectionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: &SelectionRules) -> Result<Self> {
        let reject = rules
            .reject
            .iter()
            .map(|pattern| glob::Pattern::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { reject })
    }

    fn is_rejected(&self, version: &Version) -> bool {
        self.reject
            .iter()
            .any(|pattern| pattern.matches(version.source()))
    }
}

impl VersionSelectionPolicy for DefaultSelectionPolicy {
    fn select_newest_component(
        &self,
        one: &dyn ComponentMetadata,
        two: &dyn ComponentMetadata,
    ) -> Newest {
        let first = Version::parse(&one.id().version);
        let second = Version::parse(&two.id().version);
        if second > first {
            Newest::Second
        } else {
            Newest::First
        }
    }

    fn select_newest_matching_component(
        &self,
        candidates: &[&dyn Candidate],
        context: &mut dyn SelectionContext,
        selector: &VersionSelector,
    ) {
        let matcher = match VersionMatcher::parse(&selector.selector) {
            Ok(matcher) => matcher,
            Err(e) => {
                context.failed(ResolveFailure::Selection {
                    subject: selector.to_string(),
                    message: e.to_string(),
                });
                return;
            }
        };

        let mut ordered = candidates.to_vec();
        ordered.sort_by(|a, b| b.version().cmp(a.version()));

        let mut found = false;
        for candidate in ordered {
            let version = candidate.version();
            if !matcher.accept(version) {
                context.not_matched(version.source());
                continue;
            }
            if matcher.needs_metadata() {
                match candidate.metadata().state {
                    MetadataState::Resolved(metadata)
                        if matcher.accept_metadata(metadata.as_ref()) => {}
                    MetadataState::Failed(failure) => {
                        context.failed(failure);
                        return;
                    }
                    _ => {
                        context.not_matched(version.source());
                        continue;
                    }
                }
            }
            if self.is_rejected(version) {
                context.rejected(version.source());
                continue;
            }

            context.matches(candidate.id());
            found = true;
            if matcher.matches_unique_version() {
                break;
            }
        }

        if !found {
            context.no_match_found();
        }
    }
}
