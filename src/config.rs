//! # Configuration Schema and Parsing
//!
//! This module defines the data structures that represent the
//! `.dynamic-resolve.yaml` configuration file, the logic for parsing and
//! validating it, and the construction of a ready-to-use resolver from it.
//!
//! ## Schema
//!
//! ```yaml
//! parallel: false
//! selection:
//!   reject: ["*-SNAPSHOT"]
//! repositories:
//!   - name: company
//!     cache: ./cache/company
//!     remote: ./mirror/company
//!     offline: false
//! ```
//!
//! - **`repositories`**: the ordered repository chain. Order matters: on a
//!   tie between two repositories, the one listed first wins.
//! - **`cache`**: local tier directory. Defaults to `<cache root>/<name>`.
//! - **`remote`**: remote tier directory. Without it the repository is
//!   cache-only.
//! - **`offline`**: never consult the remote tier and treat cached answers
//!   as final.
//! - **`selection.reject`**: glob patterns for versions that must never be
//!   selected.
//! - **`parallel`**: resolve the repositories of one pass concurrently.
//!
//! Relative paths are resolved against the directory containing the
//! configuration file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::directory::DirectoryRepository;
use crate::error::{Error, Result};
use crate::policy::{DefaultSelectionPolicy, SelectionRules};
use crate::resolver::DynamicVersionResolver;

/// One entry of the repository chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Unique repository name, used in diagnostics.
    pub name: String,
    /// Local tier directory.
    #[serde(default)]
    pub cache: Option<PathBuf>,
    /// Remote tier directory.
    #[serde(default)]
    pub remote: Option<PathBuf>,
    #[serde(default)]
    pub offline: bool,
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub selection: SelectionRules,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

impl Config {
    /// Checks the constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.repositories.is_empty() {
            return Err(Error::ConfigParse {
                message: "No repositories configured".to_string(),
                hint: Some(
                    "Add at least one entry under 'repositories:' with a 'name'".to_string(),
                ),
            });
        }

        let mut seen = HashSet::new();
        for repository in &self.repositories {
            if repository.name.trim().is_empty() {
                return Err(Error::ConfigParse {
                    message: "Repository name must not be empty".to_string(),
                    hint: Some("Give every repository a unique 'name'".to_string()),
                });
            }
            if !seen.insert(repository.name.as_str()) {
                return Err(Error::ConfigParse {
                    message: format!("Duplicate repository name '{}'", repository.name),
                    hint: Some("Repository names must be unique".to_string()),
                });
            }
        }

        for pattern in &self.selection.reject {
            glob::Pattern::new(pattern).map_err(|e| Error::ConfigParse {
                message: format!("Invalid reject pattern '{}': {}", pattern, e),
                hint: Some("Reject patterns use glob syntax, e.g. '*-SNAPSHOT'".to_string()),
            })?;
        }
        Ok(())
    }

    /// Builds the resolver described by this configuration.
    ///
    /// `base_dir` anchors relative paths; `cache_root` hosts the cache of
    /// repositories that do not name one.
    pub fn build_resolver(
        &self,
        base_dir: &Path,
        cache_root: &Path,
    ) -> Result<DynamicVersionResolver> {
        self.validate()?;
        let policy = DefaultSelectionPolicy::with_rules(&self.selection)?;
        let resolver = DynamicVersionResolver::new(Arc::new(policy));
        let mut resolver = resolver.with_parallel(self.parallel);
        for repository in &self.repositories {
            resolver.add(Arc::new(repository.build(base_dir, cache_root)));
        }
        Ok(resolver)
    }
}

impl RepositoryConfig {
    pub fn cache_dir(&self, base_dir: &Path, cache_root: &Path) -> PathBuf {
        match &self.cache {
            Some(cache) => base_dir.join(cache),
            None => cache_root.join(&self.name),
        }
    }

    pub fn remote_dir(&self, base_dir: &Path) -> Option<PathBuf> {
        self.remote.as_ref().map(|remote| base_dir.join(remote))
    }

    fn build(&self, base_dir: &Path, cache_root: &Path) -> DirectoryRepository {
        DirectoryRepository::new(
            &self.name,
            self.cache_dir(base_dir, cache_root),
            self.remote_dir(base_dir),
            self.offline,
        )
    }
}

/// Parses and validates a YAML configuration string.
pub fn parse(yaml_content: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: Some("See the 'repositories:' schema in the documentation".to_string()),
    })?;
    config.validate()?;
    Ok(config)
}

/// Parses a configuration from a YAML file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
