//! # Versions Command Implementation
//!
//! This module implements the `versions` subcommand, which shows what every
//! configured repository lists for one module. Each repository is driven
//! through both of its tiers, so the output reflects the union a resolution
//! would eventually see.
//!
//! This command is a safe, read-only operation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use indexmap::IndexSet;

use dynamic_resolve::access::{ListingState, ModuleRepository};
use dynamic_resolve::defaults::{CACHE_ROOT_ENV, DEFAULT_CONFIG_FILE};
use dynamic_resolve::listing::VersionListingProbe;
use dynamic_resolve::model::{ModuleId, VersionSelector};
use dynamic_resolve::output::{emoji, OutputConfig};
use dynamic_resolve::suggestions;

/// List the versions each repository knows for a module
#[derive(Args, Debug)]
pub struct VersionsArgs {
    /// Module coordinate, e.g. `org.example:lib`.
    #[arg(value_name = "GROUP:NAME")]
    pub module: String,

    /// Path to the .dynamic-resolve.yaml configuration file.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// The root directory for repository caches.
    #[arg(long, value_name = "DIR", env = CACHE_ROOT_ENV)]
    pub cache_root: Option<PathBuf>,
}

/// What one repository listed, after both tiers.
#[derive(Debug)]
struct RepositoryListing {
    name: String,
    state: ListingState,
    attempted: IndexSet<String>,
}

fn list_repository(module: &ModuleId, repository: &Arc<dyn ModuleRepository>) -> RepositoryListing {
    let selector = VersionSelector::new(&module.group, &module.name, "latest");
    let probe = VersionListingProbe::new(selector, Arc::clone(repository));
    let mut state = probe.resolve();
    if probe.can_make_further_attempts() {
        state = probe.resolve();
    }
    let mut attempted = IndexSet::new();
    probe.apply_to(&mut attempted);
    RepositoryListing {
        name: repository.name().to_string(),
        state,
        attempted,
    }
}

/// Execute the `versions` command.
pub fn execute(args: VersionsArgs, output: &OutputConfig) -> Result<()> {
    let module = ModuleId::parse(&args.module)
        .map_err(|_| suggestions::invalid_coordinate(&args.module, "group:name"))?;
    let resolver = super::load_resolver(&args.config, args.cache_root)?;

    for repository in resolver.repositories() {
        let listing = list_repository(&module, repository);
        match &listing.state {
            ListingState::Listed(versions) if !versions.is_empty() => {
                println!(
                    "{} {}: {}",
                    emoji(output, "📦", "[LISTED]"),
                    output.highlight(&listing.name),
                    versions.join(", ")
                );
            }
            ListingState::Listed(_) | ListingState::Unknown => {
                let marker = emoji(output, "∅", "[EMPTY]");
                println!("{} {}: no versions", marker, listing.name);
            }
            ListingState::Failed(failure) => {
                let marker = emoji(output, "❌", "[FAILED]");
                println!("{} {}: {}", marker, listing.name, failure);
            }
        }
        for location in &listing.attempted {
            println!("    {}", output.dim(location));
        }
    }
    Ok(())
}
