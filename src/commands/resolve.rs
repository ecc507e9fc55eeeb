//! # Resolve Command Implementation
//!
//! This module implements the `resolve` subcommand, which resolves one
//! `group:name:selector` coordinate against the repositories of a
//! `.dynamic-resolve.yaml` configuration and prints the winner.
//!
//! Output names the chosen version, the repository it came from, the
//! location its metadata was read from and, for range selectors, every
//! version that matched. `--json` prints the same as one JSON object.
//!
//! A request that matches nothing exits non-zero with the full not-found
//! report: unmatched and rejected versions, and every searched location.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use dynamic_resolve::defaults::{CACHE_ROOT_ENV, DEFAULT_CONFIG_FILE};
use dynamic_resolve::error::Error;
use dynamic_resolve::metadata::ModuleSource;
use dynamic_resolve::model::VersionSelector;
use dynamic_resolve::output::{emoji, OutputConfig};
use dynamic_resolve::resolver::Resolution;
use dynamic_resolve::suggestions;

/// Resolve a dynamic version selector
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Dependency coordinate, e.g. `org.example:lib:1.+` or `org.example:lib:[1.0,2.0)`.
    #[arg(value_name = "GROUP:NAME:SELECTOR")]
    pub coordinate: String,

    /// Path to the .dynamic-resolve.yaml configuration file.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// The root directory for repository caches.
    ///
    /// Defaults to the system cache directory (`~/.cache/dynamic-resolve` on
    /// Linux, `~/Library/Caches/dynamic-resolve` on macOS).
    #[arg(long, value_name = "DIR", env = CACHE_ROOT_ENV)]
    pub cache_root: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ResolutionReport<'a> {
    selector: String,
    repository: &'a str,
    group: &'a str,
    name: &'a str,
    version: &'a str,
    status: &'a str,
    source: Option<&'a ModuleSource>,
    matching_versions: Vec<&'a str>,
}

impl<'a> ResolutionReport<'a> {
    fn new(selector: &VersionSelector, resolution: &'a Resolution) -> Self {
        let id = resolution.id();
        let matching_versions = match resolution.all_versions() {
            Some(all) => all.iter().map(String::as_str).collect(),
            None => vec![id.version.as_str()],
        };
        Self {
            selector: selector.to_string(),
            repository: &resolution.repository,
            group: &id.group,
            name: &id.name,
            version: &id.version,
            status: resolution.metadata.status(),
            source: resolution.metadata.source(),
            matching_versions,
        }
    }
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs, output: &OutputConfig) -> Result<()> {
    let selector = VersionSelector::parse(&args.coordinate)
        .map_err(|_| suggestions::invalid_coordinate(&args.coordinate, "group:name:selector"))?;
    let resolver = super::load_resolver(&args.config, args.cache_root)?;

    let resolution = match resolver.resolve(&selector) {
        Ok(resolution) => resolution,
        Err(e @ Error::NotFound { .. }) => {
            return Err(suggestions::version_not_found(&e.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let report = ResolutionReport::new(&selector, &resolution);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} -> {} from {}",
        emoji(output, "✅", "[OK]"),
        report.selector,
        output.highlight(report.version),
        output.highlight(report.repository)
    );
    println!("  status: {}", report.status);
    if let Some(source) = report.source {
        println!("  source: {}", output.dim(&source.location));
    }
    if report.matching_versions.len() > 1 {
        let matching = report.matching_versions.join(", ");
        println!("  matching versions: {}", matching);
    }
    Ok(())
}
