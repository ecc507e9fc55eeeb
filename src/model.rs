//! # Dependency Coordinates and Versions
//!
//! The value types every other module passes around:
//!
//! - **`ModuleId`**: a component without a version (`group:name`).
//! - **`VersionSelector`**: the requested dependency, whose version part may
//!   be an exact version, a range or a floating marker such as `latest`.
//! - **`ComponentId`**: one concrete, fully-qualified version of a component.
//! - **`Version`**: a parsed version string with a total order.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A component identity without a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Parses a `group:name` coordinate.
    pub fn parse(coordinate: &str) -> Result<Self> {
        match coordinate.split(':').collect::<Vec<_>>().as_slice() {
            [group, name] if !group.is_empty() && !name.is_empty() => Ok(Self::new(*group, *name)),
            _ => Err(Error::InvalidSelector {
                selector: coordinate.to_string(),
                message: "expected 'group:name'".to_string(),
            }),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// The requested dependency coordinate. Immutable input to a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionSelector {
    pub group: String,
    pub name: String,
    /// Version, range or floating marker as written by the user.
    pub selector: String,
}

impl VersionSelector {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        selector: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            selector: selector.into(),
        }
    }

    /// Parses a `group:name:selector` coordinate.
    ///
    /// The selector part may itself contain `:`-free range syntax such as
    /// `[1.0,2.0)`; everything after the second colon is the selector.
    pub fn parse(coordinate: &str) -> Result<Self> {
        let mut parts = coordinate.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(name), Some(selector))
                if !group.is_empty() && !name.is_empty() && !selector.trim().is_empty() =>
            {
                Ok(Self::new(group, name, selector.trim()))
            }
            _ => Err(Error::InvalidSelector {
                selector: coordinate.to_string(),
                message: "expected 'group:name:version'".to_string(),
            }),
        }
    }

    pub fn module(&self) -> ModuleId {
        ModuleId::new(&self.group, &self.name)
    }

    /// The same dependency, pinned to one concrete version.
    pub fn with_version(&self, version: &str) -> Self {
        Self::new(&self.group, &self.name, version)
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.selector)
    }
}

/// One concrete version of a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ComponentId {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// The candidate identifier for `version` of the selected module.
    pub fn for_selector(selector: &VersionSelector, version: &str) -> Self {
        Self::new(&selector.group, &selector.name, version)
    }

    pub fn module(&self) -> ModuleId {
        ModuleId::new(&self.group, &self.name)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A version string together with its lenient semantic-version parse.
///
/// Ordering: parseable versions compare semantically and sort above
/// unparseable ones; unparseable versions compare lexically. The raw string
/// breaks remaining ties, so `1.0` and `1.0.0` are distinct but adjacent.
#[derive(Debug, Clone)]
pub struct Version {
    source: String,
    parsed: Option<semver::Version>,
}

impl Version {
    pub fn parse(source: &str) -> Self {
        Self {
            source: source.to_string(),
            parsed: parse_lenient(source),
        }
    }

    /// The version exactly as it was listed.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn semver(&self) -> Option<&semver::Version> {
        self.parsed.as_ref()
    }

    pub fn is_prerelease(&self) -> bool {
        self.parsed.as_ref().is_some_and(|v| !v.pre.is_empty())
    }

    /// Compares by value only, so `1.0` and `1.0.0` are equal. Falls back to
    /// the total order when either side does not parse.
    pub fn semantic_cmp(&self, other: &Self) -> Ordering {
        match (&self.parsed, &other.parsed) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => self.cmp(other),
        }
    }
}

/// Accepts `1`, `1.2`, `1.2.3`, an optional `v` prefix and a `-`/`+` suffix.
fn parse_lenient(source: &str) -> Option<semver::Version> {
    let trimmed = source.strip_prefix('v').unwrap_or(source);
    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);

    let segments: Vec<&str> = core.split('.').collect();
    if segments.is_empty()
        || segments.len() > 3
        || segments
            .iter()
            .any(|s| s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }

    let mut padded = segments.join(".");
    for _ in segments.len()..3 {
        padded.push_str(".0");
    }
    semver::Version::parse(&format!("{}{}", padded, suffix)).ok()
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let semantic = match (&self.parsed, &other.parsed) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        semantic.then_with(|| self.source.cmp(&other.source))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
