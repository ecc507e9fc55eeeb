//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a fixture that lays out repository directories and a
//! configuration file in a temporary directory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = RepoFixture::new()
//!     .with_module("mirror", "1.0")
//!     .with_config(configs::SINGLE_REMOTE);
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
#[allow(unused_imports)]
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    pub use super::configs;
    pub use super::RepoFixture;
    pub use super::{GROUP, NAME};
}

/// Group of the module every fixture publishes.
pub const GROUP: &str = "org.example";

/// Name of the module every fixture publishes.
pub const NAME: &str = "lib";

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// One repository with a cache and a remote mirror.
    pub const SINGLE_REMOTE: &str = r#"
repositories:
  - name: central
    cache: cache/central
    remote: mirror
"#;

    /// A company repository in front of a public one.
    pub const TWO_REPOSITORIES: &str = r#"
repositories:
  - name: company
    cache: cache/company
    remote: company
  - name: central
    cache: cache/central
    remote: mirror
"#;

    /// Offline cache-only repository.
    pub const OFFLINE: &str = r#"
repositories:
  - name: central
    cache: cache/central
    remote: mirror
    offline: true
"#;

    /// Snapshot versions are never selected.
    pub const REJECT_SNAPSHOTS: &str = r#"
selection:
  reject: ["*-SNAPSHOT"]
repositories:
  - name: central
    remote: mirror
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "repositories: [name: ";
}

/// A temporary workspace holding repository directories and a config file.
pub struct RepoFixture {
    pub temp: assert_fs::TempDir,
}

#[allow(dead_code)]
impl RepoFixture {
    pub fn new() -> Self {
        Self {
            temp: assert_fs::TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Path of the configuration file inside the fixture.
    pub fn config_path(&self) -> PathBuf {
        self.path().join(".dynamic-resolve.yaml")
    }

    /// Cache root passed to the resolver for repositories without a `cache`.
    pub fn cache_root(&self) -> PathBuf {
        self.temp.child("cache-root").path().to_path_buf()
    }

    pub fn with_config(self, yaml: &str) -> Self {
        self.temp
            .child(".dynamic-resolve.yaml")
            .write_str(yaml)
            .expect("Failed to write config");
        self
    }

    /// Publishes `org.example:lib:<version>` with a default descriptor under
    /// `<root>`, relative to the fixture.
    pub fn with_module(self, root: &str, version: &str) -> Self {
        self.with_descriptor(root, version, "status: release\n")
    }

    pub fn with_descriptor(self, root: &str, version: &str, descriptor: &str) -> Self {
        self.temp
            .child(root)
            .child(GROUP)
            .child(NAME)
            .child(version)
            .child("module.yaml")
            .write_str(descriptor)
            .expect("Failed to write module descriptor");
        self
    }

    /// Lists a version without publishing a descriptor for it.
    pub fn with_listed_only(self, root: &str, version: &str) -> Self {
        self.temp
            .child(root)
            .child(GROUP)
            .child(NAME)
            .child(version)
            .create_dir_all()
            .expect("Failed to create version directory");
        self
    }
}
