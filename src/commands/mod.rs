//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `dynamic-resolve` command-line tool. Each subcommand is defined in its own
//! file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic, calling into the `dynamic_resolve` library.

pub mod resolve;
pub mod versions;

use std::path::{Path, PathBuf};

use anyhow::Result;

use dynamic_resolve::config;
use dynamic_resolve::resolver::DynamicVersionResolver;

/// Loads the configuration file and builds its resolver.
///
/// Relative paths in the file resolve against the file's directory.
pub(crate) fn load_resolver(
    config_path: &Path,
    cache_root: Option<PathBuf>,
) -> Result<DynamicVersionResolver> {
    if !config_path.exists() {
        return Err(dynamic_resolve::suggestions::config_not_found(config_path));
    }

    let config = config::from_file(config_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load config from {}: {}",
            config_path.display(),
            e
        )
    })?;

    let base_dir = config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let cache_root = cache_root.unwrap_or_else(dynamic_resolve::defaults::default_cache_root);

    Ok(config.build_resolver(&base_dir, &cache_root)?)
}
