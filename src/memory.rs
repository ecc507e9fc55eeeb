//! In-memory repositories.
//!
//! `MemoryAccess` answers listing and metadata requests from maps populated
//! up front. It counts listing requests and keeps the overrides of every
//! metadata request it receives. It backs
//! the test suites and benchmarks, and suits embedders that already hold
//! their component catalogue in memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::trace;

use crate::access::{
    ComponentOverrides, ListingOutcome, MetadataOutcome, ModuleRepository, RepositoryAccess,
};
use crate::error::{AccessTier, ResolveFailure};
use crate::metadata::{ComponentMetadata, ModuleMetadata, ModuleSource};
use crate::model::{ComponentId, ModuleId, VersionSelector};

#[derive(Debug, Clone)]
enum ListingEntry {
    Versions(Vec<String>),
    Failure(String),
}

#[derive(Debug, Clone)]
enum MetadataEntry {
    Present(ModuleMetadata),
    Missing,
    Failure(String),
}

/// One tier of an in-memory repository.
#[derive(Debug)]
pub struct MemoryAccess {
    repository: String,
    tier: AccessTier,
    authoritative: bool,
    listings: HashMap<ModuleId, ListingEntry>,
    metadata: HashMap<ComponentId, MetadataEntry>,
    listing_calls: AtomicUsize,
    metadata_requests: Mutex<Vec<ComponentOverrides>>,
}

impl MemoryAccess {
    /// An empty tier: every request gets an `Unknown` answer.
    pub fn new(repository: impl Into<String>, tier: AccessTier) -> Self {
        Self {
            repository: repository.into(),
            tier,
            authoritative: false,
            listings: HashMap::new(),
            metadata: HashMap::new(),
            listing_calls: AtomicUsize::new(0),
            metadata_requests: Mutex::new(Vec::new()),
        }
    }

    /// Marks every answer of this tier as authoritative.
    pub fn authoritative(mut self, authoritative: bool) -> Self {
        self.authoritative = authoritative;
        self
    }

    pub fn with_versions(mut self, group: &str, name: &str, versions: &[&str]) -> Self {
        self.listings.insert(
            ModuleId::new(group, name),
            ListingEntry::Versions(versions.iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    pub fn with_listing_failure(mut self, group: &str, name: &str, message: &str) -> Self {
        self.listings.insert(
            ModuleId::new(group, name),
            ListingEntry::Failure(message.to_string()),
        );
        self
    }

    /// Registers metadata with the default `release` status.
    pub fn with_module(self, group: &str, name: &str, version: &str) -> Self {
        let metadata = ModuleMetadata::new(ComponentId::new(group, name, version));
        self.with_metadata(metadata)
    }

    pub fn with_metadata(mut self, metadata: ModuleMetadata) -> Self {
        self.metadata
            .insert(metadata.id().clone(), MetadataEntry::Present(metadata));
        self
    }

    /// Registers several versions at once, listing and metadata together.
    pub fn with_modules(self, group: &str, name: &str, versions: &[&str]) -> Self {
        let access = self.with_versions(group, name, versions);
        versions
            .iter()
            .fold(access, |acc, version| acc.with_module(group, name, version))
    }

    /// Reports the version as definitively absent from this tier.
    pub fn with_missing(mut self, group: &str, name: &str, version: &str) -> Self {
        self.metadata.insert(
            ComponentId::new(group, name, version),
            MetadataEntry::Missing,
        );
        self
    }

    pub fn with_metadata_failure(
        mut self,
        group: &str,
        name: &str,
        version: &str,
        message: &str,
    ) -> Self {
        self.metadata.insert(
            ComponentId::new(group, name, version),
            MetadataEntry::Failure(message.to_string()),
        );
        self
    }

    /// Number of `list_versions` calls received so far.
    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    /// Number of `resolve_metadata` calls received so far.
    pub fn metadata_calls(&self) -> usize {
        self.requests().len()
    }

    /// Overrides of every `resolve_metadata` call, in arrival order.
    pub fn requests(&self) -> Vec<ComponentOverrides> {
        self.metadata_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn total_calls(&self) -> usize {
        self.listing_calls() + self.metadata_calls()
    }

    fn location(&self, subject: &dyn std::fmt::Display) -> String {
        format!("memory://{}/{}/{}", self.repository, self.tier, subject)
    }

    fn failure(&self, subject: &dyn std::fmt::Display, message: &str) -> ResolveFailure {
        ResolveFailure::Access {
            repository: self.repository.clone(),
            tier: self.tier,
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }
}

impl RepositoryAccess for MemoryAccess {
    fn list_versions(&self, selector: &VersionSelector) -> ListingOutcome {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        let module = selector.module();
        trace!("{} {} listing {}", self.repository, self.tier, module);

        let outcome = match self.listings.get(&module) {
            None => return ListingOutcome::unknown(),
            Some(ListingEntry::Versions(versions)) => ListingOutcome::listed(versions.clone()),
            Some(ListingEntry::Failure(message)) => {
                ListingOutcome::failed(self.failure(&module, message))
            }
        };
        outcome
            .authoritative(self.authoritative)
            .attempted(self.location(&module))
    }

    fn resolve_metadata(
        &self,
        id: &ComponentId,
        overrides: &ComponentOverrides,
    ) -> MetadataOutcome {
        self.metadata_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(overrides.clone());
        trace!("{} {} metadata {}", self.repository, self.tier, id);

        let location = self.location(id);
        let outcome = match self.metadata.get(id) {
            None => return MetadataOutcome::unknown(),
            Some(MetadataEntry::Present(metadata)) => {
                let source = ModuleSource::new(&self.repository, self.tier, &location);
                let metadata: Arc<dyn ComponentMetadata> =
                    Arc::new(metadata.clone().with_module_source(source));
                MetadataOutcome::resolved(metadata)
            }
            Some(MetadataEntry::Missing) => MetadataOutcome::missing(),
            Some(MetadataEntry::Failure(message)) => {
                MetadataOutcome::failed(self.failure(id, message))
            }
        };
        outcome
            .authoritative(self.authoritative)
            .attempted(location)
    }
}

/// A named repository made of two in-memory tiers.
#[derive(Debug)]
pub struct MemoryRepository {
    name: String,
    local: MemoryAccess,
    remote: MemoryAccess,
}

impl MemoryRepository {
    /// A repository whose tiers are both empty.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            local: MemoryAccess::new(&name, AccessTier::Local),
            remote: MemoryAccess::new(&name, AccessTier::Remote),
            name,
        }
    }

    /// Configures the local tier.
    pub fn local<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(MemoryAccess) -> MemoryAccess,
    {
        self.local = configure(self.local);
        self
    }

    /// Configures the remote tier.
    pub fn remote<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(MemoryAccess) -> MemoryAccess,
    {
        self.remote = configure(self.remote);
        self
    }

    pub fn local_tier(&self) -> &MemoryAccess {
        &self.local
    }

    pub fn remote_tier(&self) -> &MemoryAccess {
        &self.remote
    }
}

impl ModuleRepository for MemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_access(&self) -> &dyn RepositoryAccess {
        &self.local
    }

    fn remote_access(&self) -> &dyn RepositoryAccess {
        &self.remote
    }
}
