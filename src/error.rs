//! # Error Handling
//!
//! This module defines the error types used throughout `dynamic-resolve`.
//!
//! ## Key Components
//!
//! - **`Error`**: The crate-wide error enum. The two resolution outcomes that
//!   are not a winner are variants here: `NotFound` (no repository listed a
//!   version satisfying the selector and nothing failed) and
//!   `ResolutionFailed` (no winner and at least one captured cause).
//!
//! - **`ResolveFailure`**: One captured cause. Failures of a single access
//!   tier never propagate directly; they are recorded as a `ResolveFailure`
//!   and only surface inside `ResolutionFailed` when no repository produced a
//!   usable answer. It is `Clone` because the same cause is held by the probe
//!   that produced it, by its repository state and by the aggregated failure.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use std::fmt;

use thiserror::Error;

/// One of the two access levels consulted, in order, for every probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    /// Local or cached state.
    Local,
    /// Remote, usually network-backed, state.
    Remote,
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTier::Local => write!(f, "local"),
            AccessTier::Remote => write!(f, "remote"),
        }
    }
}

/// A single captured resolution cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// One tier of one repository failed to list versions or fetch metadata.
    #[error("{tier} access to repository '{repository}' failed for {subject}: {message}")]
    Access {
        repository: String,
        tier: AccessTier,
        subject: String,
        message: String,
    },

    /// The selection policy could not evaluate the candidates.
    #[error("version selection failed for {subject}: {message}")]
    Selection { subject: String, message: String },
}

/// Main error type for dynamic-resolve operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while parsing the configuration file.
    #[error("Configuration parsing error: {message}{}", hint_suffix(hint))]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A dependency coordinate or version selector could not be parsed.
    #[error("Invalid version selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// No repository contained a version satisfying the selector.
    #[error("{}", not_found_message(selector, attempted, unmatched, rejected))]
    NotFound {
        selector: String,
        /// Every location consulted, across every repository.
        attempted: Vec<String>,
        /// Listed versions the selector did not match.
        unmatched: Vec<String>,
        /// Listed versions excluded by the selection rules.
        rejected: Vec<String>,
    },

    /// No winner was found and at least one access failed.
    #[error("Could not resolve {selector}.{}", cause_lines(causes))]
    ResolutionFailed {
        selector: String,
        causes: Vec<ResolveFailure>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!("\n  hint: {}", hint),
        None => String::new(),
    }
}

fn cause_lines(causes: &[ResolveFailure]) -> String {
    causes
        .iter()
        .map(|c| format!("\n  caused by: {}", c))
        .collect()
}

fn not_found_message(
    selector: &str,
    attempted: &[String],
    unmatched: &[String],
    rejected: &[String],
) -> String {
    let mut message = format!("Could not find any version that matches {}.", selector);
    if !unmatched.is_empty() {
        message.push_str("\nVersions that do not match:");
        for version in unmatched {
            message.push_str(&format!("\n  - {}", version));
        }
    }
    if !rejected.is_empty() {
        message.push_str("\nVersions rejected by component selection rules:");
        for version in rejected {
            message.push_str(&format!("\n  - {}", version));
        }
    }
    if attempted.is_empty() {
        message.push_str("\nNo locations were searched.");
    } else {
        message.push_str("\nSearched in the following locations:");
        for location in attempted {
            message.push_str(&format!("\n  - {}", location));
        }
    }
    message
}
