//! # Component Metadata
//!
//! Resolved metadata for one component version, and the decorator that
//! carries every version a selector matched.
//!
//! `ComponentMetadata` is a trait so that the winning metadata can be either
//! the `ModuleMetadata` a repository produced or a `MultipleCandidateMetadata`
//! wrapping it. The wrapper forwards every accessor except `all_versions`,
//! which conflict resolution later uses to intersect overlapping ranges.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AccessTier;
use crate::model::ComponentId;

/// Default status assigned to descriptors that do not declare one.
pub const DEFAULT_STATUS: &str = "release";

/// Default status scheme, lowest to highest maturity.
pub fn default_status_scheme() -> Vec<String> {
    vec![
        "integration".to_string(),
        "milestone".to_string(),
        "release".to_string(),
    ]
}

/// Where a piece of metadata was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSource {
    pub repository: String,
    pub tier: AccessTier,
    pub location: String,
}

impl ModuleSource {
    pub fn new(
        repository: impl Into<String>,
        tier: AccessTier,
        location: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            tier,
            location: location.into(),
        }
    }
}

impl fmt::Display for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.repository, self.tier, self.location)
    }
}

/// A dependency declared by a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub group: String,
    pub name: String,
    pub version: String,
}

/// An artifact published by a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub classifier: Option<String>,
}

fn default_extension() -> String {
    "jar".to_string()
}

/// Read access to the resolved metadata of one component version.
pub trait ComponentMetadata: fmt::Debug + Send + Sync {
    fn id(&self) -> &ComponentId;

    /// Maturity status, e.g. `integration` or `release`.
    fn status(&self) -> &str;

    /// Statuses ordered from least to most mature.
    fn status_scheme(&self) -> &[String];

    fn is_changing(&self) -> bool;

    fn source(&self) -> Option<&ModuleSource>;

    fn dependencies(&self) -> &[DependencySpec];

    fn artifacts(&self) -> &[ArtifactSpec];

    /// Looks up a published artifact by name, extension and classifier.
    fn artifact(
        &self,
        name: &str,
        extension: &str,
        classifier: Option<&str>,
    ) -> Option<&ArtifactSpec> {
        self.artifacts().iter().find(|a| {
            a.name == name && a.extension == extension && a.classifier.as_deref() == classifier
        })
    }

    /// A copy of this metadata carrying a different source.
    fn with_source(&self, source: ModuleSource) -> Arc<dyn ComponentMetadata>;

    /// Every version the selector matched, when more than one did.
    fn all_versions(&self) -> Option<&[String]> {
        None
    }
}

/// On-disk (`module.yaml`) description of one component version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_scheme: Option<Vec<String>>,
    #[serde(default)]
    pub changing: bool,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactSpec>,
}

/// Metadata as produced by a repository.
#[derive(Debug, Clone)]
pub struct ModuleMetadata {
    id: ComponentId,
    status: String,
    status_scheme: Vec<String>,
    changing: bool,
    source: Option<ModuleSource>,
    dependencies: Vec<DependencySpec>,
    artifacts: Vec<ArtifactSpec>,
}

impl ModuleMetadata {
    pub fn new(id: ComponentId) -> Self {
        Self {
            id,
            status: DEFAULT_STATUS.to_string(),
            status_scheme: default_status_scheme(),
            changing: false,
            source: None,
            dependencies: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn from_descriptor(id: ComponentId, descriptor: ModuleDescriptor) -> Self {
        Self {
            id,
            status: descriptor
                .status
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            status_scheme: descriptor
                .status_scheme
                .unwrap_or_else(default_status_scheme),
            changing: descriptor.changing,
            source: None,
            dependencies: descriptor.dependencies,
            artifacts: descriptor.artifacts,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_module_source(mut self, source: ModuleSource) -> Self {
        self.source = Some(source);
        self
    }
}

impl ComponentMetadata for ModuleMetadata {
    fn id(&self) -> &ComponentId {
        &self.id
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn status_scheme(&self) -> &[String] {
        &self.status_scheme
    }

    fn is_changing(&self) -> bool {
        self.changing
    }

    fn source(&self) -> Option<&ModuleSource> {
        self.source.as_ref()
    }

    fn dependencies(&self) -> &[DependencySpec] {
        &self.dependencies
    }

    fn artifacts(&self) -> &[ArtifactSpec] {
        &self.artifacts
    }

    fn with_source(&self, source: ModuleSource) -> Arc<dyn ComponentMetadata> {
        Arc::new(self.clone().with_module_source(source))
    }
}

/// The chosen metadata of a range selector, plus every version it matched.
#[derive(Debug, Clone)]
pub struct MultipleCandidateMetadata {
    selected: Arc<dyn ComponentMetadata>,
    all_versions: Vec<String>,
}

impl MultipleCandidateMetadata {
    pub fn new(all_versions: Vec<String>, selected: Arc<dyn ComponentMetadata>) -> Self {
        Self {
            selected,
            all_versions,
        }
    }
}

impl ComponentMetadata for MultipleCandidateMetadata {
    fn id(&self) -> &ComponentId {
        self.selected.id()
    }

    fn status(&self) -> &str {
        self.selected.status()
    }

    fn status_scheme(&self) -> &[String] {
        self.selected.status_scheme()
    }

    fn is_changing(&self) -> bool {
        self.selected.is_changing()
    }

    fn source(&self) -> Option<&ModuleSource> {
        self.selected.source()
    }

    fn dependencies(&self) -> &[DependencySpec] {
        self.selected.dependencies()
    }

    fn artifacts(&self) -> &[ArtifactSpec] {
        self.selected.artifacts()
    }

    fn artifact(
        &self,
        name: &str,
        extension: &str,
        classifier: Option<&str>,
    ) -> Option<&ArtifactSpec> {
        self.selected.artifact(name, extension, classifier)
    }

    fn with_source(&self, source: ModuleSource) -> Arc<dyn ComponentMetadata> {
        Arc::new(Self::new(
            self.all_versions.clone(),
            self.selected.with_source(source),
        ))
    }

    fn all_versions(&self) -> Option<&[String]> {
        Some(&self.all_versions)
    }
}
