//! # Filesystem Repositories
//!
//! A repository whose tiers are plain directory trees laid out as
//!
//! ```text
//! <root>/<group>/<name>/<version>/module.yaml
//! ```
//!
//! The local tier is a cache: a path it does not have means it has nothing to
//! say, and its answers only count as authoritative in offline mode. The
//! remote tier is the origin: a path it does not have means the module or
//! version does not exist. Read and parse errors become `Failed` outcomes.

use std::fs;
use std::path::{Path, PathBuf};

use log::trace;

use crate::access::{
    ComponentOverrides, ListingOutcome, MetadataOutcome, ModuleRepository, RepositoryAccess,
};
use crate::error::{AccessTier, ResolveFailure};
use crate::metadata::{ModuleDescriptor, ModuleMetadata, ModuleSource};
use crate::model::{ComponentId, Version, VersionSelector};

/// File name of the per-version descriptor.
pub const DESCRIPTOR_FILE: &str = "module.yaml";

/// How a directory tier interprets absent paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    /// Absent means unknown.
    Cache,
    /// Absent means missing.
    Origin,
}

/// One directory-backed tier.
#[derive(Debug, Clone)]
pub struct DirectoryAccess {
    repository: String,
    tier: AccessTier,
    kind: DirectoryKind,
    root: Option<PathBuf>,
    authoritative: bool,
}

impl DirectoryAccess {
    /// A cache tier; `offline` makes its answers authoritative.
    pub fn cache(repository: impl Into<String>, root: impl Into<PathBuf>, offline: bool) -> Self {
        Self {
            repository: repository.into(),
            tier: AccessTier::Local,
            kind: DirectoryKind::Cache,
            root: Some(root.into()),
            authoritative: offline,
        }
    }

    /// An origin tier; `None` disables it.
    pub fn origin(repository: impl Into<String>, root: Option<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            tier: AccessTier::Remote,
            kind: DirectoryKind::Origin,
            root,
            authoritative: true,
        }
    }

    pub fn kind(&self) -> DirectoryKind {
        self.kind
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn failure(
        &self,
        subject: &dyn std::fmt::Display,
        message: impl std::fmt::Display,
    ) -> ResolveFailure {
        ResolveFailure::Access {
            repository: self.repository.clone(),
            tier: self.tier,
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }

    fn read_versions(&self, dir: &Path) -> std::io::Result<Vec<String>> {
        let mut versions = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                versions.push(name.to_string());
            }
        }
        // Directory iteration order is platform dependent.
        versions.sort_by_cached_key(|v| Version::parse(v));
        Ok(versions)
    }
}

impl RepositoryAccess for DirectoryAccess {
    fn list_versions(&self, selector: &VersionSelector) -> ListingOutcome {
        let Some(root) = &self.root else {
            return ListingOutcome::unknown();
        };
        let module = selector.module();
        let dir = root.join(&module.group).join(&module.name);
        let location = dir.display().to_string();
        trace!("{} {} listing {}", self.repository, self.tier, location);

        if !dir.exists() {
            return match self.kind {
                DirectoryKind::Cache => ListingOutcome::unknown().attempted(location),
                DirectoryKind::Origin => ListingOutcome::listed(Vec::<String>::new())
                    .authoritative(true)
                    .attempted(location),
            };
        }

        let outcome = match self.read_versions(&dir) {
            Ok(versions) => ListingOutcome::listed(versions),
            Err(e) => ListingOutcome::failed(self.failure(&module, e)),
        };
        outcome
            .authoritative(self.authoritative)
            .attempted(location)
    }

    fn resolve_metadata(
        &self,
        id: &ComponentId,
        overrides: &ComponentOverrides,
    ) -> MetadataOutcome {
        let Some(root) = &self.root else {
            return MetadataOutcome::unknown();
        };
        let path = root
            .join(&id.group)
            .join(&id.name)
            .join(&id.version)
            .join(DESCRIPTOR_FILE);
        let location = path.display().to_string();
        trace!(
            "{} {} metadata {} for {}",
            self.repository,
            self.tier,
            location,
            overrides.requested
        );

        if !path.is_file() {
            return match self.kind {
                DirectoryKind::Cache => MetadataOutcome::unknown().attempted(location),
                DirectoryKind::Origin => MetadataOutcome::missing()
                    .authoritative(true)
                    .attempted(location),
            };
        }

        let outcome = match read_descriptor(&path) {
            Ok(descriptor) => {
                let source = ModuleSource::new(&self.repository, self.tier, &location);
                let metadata = ModuleMetadata::from_descriptor(id.clone(), descriptor);
                let metadata = metadata.with_module_source(source);
                MetadataOutcome::resolved(std::sync::Arc::new(metadata))
            }
            Err(message) => MetadataOutcome::failed(self.failure(id, message)),
        };
        outcome
            .authoritative(self.authoritative)
            .attempted(location)
    }
}

fn read_descriptor(path: &Path) -> std::result::Result<ModuleDescriptor, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    if content.trim().is_empty() {
        return Ok(ModuleDescriptor::default());
    }
    serde_yaml::from_str(&content).map_err(|e| format!("invalid {}: {}", DESCRIPTOR_FILE, e))
}

/// A named repository backed by a cache directory and an optional origin
/// directory.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    name: String,
    cache: DirectoryAccess,
    origin: DirectoryAccess,
}

impl DirectoryRepository {
    /// In offline mode the origin is never consulted and cached answers are
    /// final.
    pub fn new(
        name: impl Into<String>,
        cache: impl Into<PathBuf>,
        origin: Option<PathBuf>,
        offline: bool,
    ) -> Self {
        let name = name.into();
        let origin = if offline { None } else { origin };
        Self {
            cache: DirectoryAccess::cache(&name, cache, offline),
            origin: DirectoryAccess::origin(&name, origin),
            name,
        }
    }

    pub fn cache(&self) -> &DirectoryAccess {
        &self.cache
    }

    pub fn origin(&self) -> &DirectoryAccess {
        &self.origin
    }
}

impl ModuleRepository for DirectoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_access(&self) -> &dyn RepositoryAccess {
        &self.cache
    }

    fn remote_access(&self) -> &dyn RepositoryAccess {
        &self.origin
    }
}
