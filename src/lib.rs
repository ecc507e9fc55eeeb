//! # Dynamic Version Resolution
//!
//! This library resolves *dynamic* dependency versions (`latest`, `1.2.+`,
//! `[1.0,2.0)`) against an ordered chain of repositories, each of which has
//! a cheap local tier and an expensive remote tier. It is used by the
//! `dynamic-resolve` command-line tool but is designed to be embedded: the
//! repositories and the version selection policy are traits.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use dynamic_resolve::memory::MemoryRepository;
//! use dynamic_resolve::model::VersionSelector;
//! use dynamic_resolve::policy::DefaultSelectionPolicy;
//! use dynamic_resolve::resolver::DynamicVersionResolver;
//!
//! let company = MemoryRepository::new("company")
//!     .local(|local| local.with_modules("org.example", "lib", &["1.0", "1.1"]));
//! let central = MemoryRepository::new("central")
//!     .local(|local| local.with_modules("org.example", "lib", &["1.0"]))
//!     .remote(|remote| remote.with_modules("org.example", "lib", &["1.0", "1.2"]));
//!
//! let mut resolver = DynamicVersionResolver::new(Arc::new(DefaultSelectionPolicy::new()));
//! resolver.add(Arc::new(company));
//! resolver.add(Arc::new(central));
//!
//! // The local tiers settle the request; central's remote tier is never paid for.
//! let resolution = resolver
//!     .resolve(&VersionSelector::parse("org.example:lib:1.+").unwrap())
//!     .unwrap();
//! assert_eq!(resolution.repository, "company");
//! assert_eq!(resolution.id().version, "1.1");
//! ```
//!
//! ## Core Concepts
//!
//! - **Repository access (`access`)**: the two-tier contract every
//!   repository implements, with in-memory (`memory`) and directory-backed
//!   (`directory`) implementations.
//! - **Probes (`listing`, `candidate`)**: memoized per-repository queries that
//!   consult each tier at most once, even under concurrent use.
//! - **Selection (`selection`, `policy`)**: the pluggable policy deciding
//!   which listed versions match a selector, and which component is newest.
//! - **Resolution (`state`, `resolver`)**: per-repository state and the
//!   two-pass orchestrator that pays for remote access only when no local
//!   answer settles the request.
//! - **Configuration (`config`)**: the `.dynamic-resolve.yaml` file
//!   describing the repository chain.

pub mod access;
pub mod attempts;
pub mod candidate;
pub mod config;
pub mod defaults;
pub mod directory;
pub mod error;
pub mod listing;
pub mod memory;
pub mod metadata;
pub mod model;
pub mod output;
pub mod policy;
pub mod resolver;
pub mod selection;
pub mod state;
pub mod suggestions;

#[cfg(test)]
mod resolver_proptest;
