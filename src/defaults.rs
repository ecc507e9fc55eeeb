//! Default values for dynamic-resolve configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Configuration file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".dynamic-resolve.yaml";

/// Environment variable overriding the cache root.
pub const CACHE_ROOT_ENV: &str = "DYNAMIC_RESOLVE_CACHE";

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/dynamic-resolve` (XDG Base Directory)
/// - macOS: `~/Library/Caches/dynamic-resolve`
/// - Windows: `{FOLDERID_LocalAppData}\dynamic-resolve`
///
/// Falls back to `.dynamic-resolve-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// Repositories without an explicit `cache` directory keep their local tier
/// under `<cache root>/<repository name>`.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".dynamic-resolve-cache"))
        .join("dynamic-resolve")
}
