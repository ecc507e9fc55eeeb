//! # Error Suggestions
//!
//! Helper functions for CLI error messages that say what went wrong and how
//! to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dynamic_resolve::suggestions;
//!
//! if !config_path.exists() {
//!     return Err(suggestions::config_not_found(config_path));
//! }
//! ```

use std::path::Path;

use crate::defaults::{CACHE_ROOT_ENV, DEFAULT_CONFIG_FILE};

/// Generate an error for when the configuration file is not found.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a {default} file listing your repositories\n\
         hint: Use -c/--config to specify a different path",
        path = path.display(),
        default = DEFAULT_CONFIG_FILE
    )
}

/// Generate an error for a malformed `group:name[:selector]` argument.
pub fn invalid_coordinate(coordinate: &str, expected: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid coordinate: {coordinate}\n\n\
         hint: Expected '{expected}', e.g. 'org.example:lib:1.+'\n\
         hint: Quote range selectors in your shell, e.g. 'org.example:lib:[1.0,2.0)'"
    )
}

/// Generate an error for a request that matched nothing in any repository.
///
/// `details` is the diagnostic report of the resolution.
pub fn version_not_found(details: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "{details}\n\n\
         hint: Run 'dynamic-resolve versions <group:name>' to see what each repository lists\n\
         hint: Populate the cache or set {env} to another cache root",
        env = CACHE_ROOT_ENV
    )
}
