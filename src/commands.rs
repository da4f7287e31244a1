// src/commands.rs
//! Command handlers for the rverflow CLI

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rverflow::repository::RepositoryProvider;
use rverflow::{report, ProjectManifest, Resolver, Source};
use std::path::Path;
use tracing::info;

/// Output format for `solve`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Run the resolver for a project manifest and print the report
pub fn cmd_solve(
    config: &Path,
    cache_root: &Path,
    lock_r: Option<&str>,
    prefer_bioc: Option<&str>,
    include_optional: bool,
    format: OutputFormat,
) -> Result<()> {
    let manifest = ProjectManifest::load(config)?;
    let options = manifest.resolve_options(lock_r, prefer_bioc, include_optional)?;
    let requirements = manifest.requirements(options.prefer_bioc_release.as_deref())?;

    let provider = RepositoryProvider::new(
        cache_root,
        options.prefer_bioc_release.clone(),
        manifest.options.github_token.clone(),
    )?;

    info!(
        "resolving {} targets for project {}",
        requirements.len(),
        manifest.project.name
    );

    let include_optional = options.include_optional;
    let resolver = Resolver::new(&provider, options);
    match resolver.resolve(&requirements) {
        Ok(solution) => {
            match format {
                OutputFormat::Human => {
                    println!("{}", report::render_human(&manifest.project.name, &solution))
                }
                OutputFormat::Json => {
                    println!("{}", report::render_json(&solution, include_optional))
                }
            }
            Ok(())
        }
        Err(error) => {
            if format == OutputFormat::Json {
                println!("{}", report::render_conflict_json(&error));
            }
            Err(error.into())
        }
    }
}

/// Prime the metadata cache for explicit packages, releases, and a manifest
pub fn cmd_update_cache(
    config: Option<&Path>,
    cache_root: &Path,
    packages: &[String],
    bioc_releases: &[String],
) -> Result<()> {
    let manifest = config.map(ProjectManifest::load).transpose()?;

    let provider = RepositoryProvider::new(
        cache_root,
        manifest
            .as_ref()
            .and_then(|m| m.options.prefer_bioc_release.clone()),
        manifest.as_ref().and_then(|m| m.options.github_token.clone()),
    )?;

    let mut processed: Vec<String> = Vec::new();

    let explicit = packages.len() + bioc_releases.len();
    let progress = if explicit > 0 {
        let bar = ProgressBar::new(explicit as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .expect("progress template is valid"),
        );
        Some(bar)
    } else {
        None
    };

    for package in packages {
        if let Some(bar) = &progress {
            bar.set_message(format!("CRAN {}", package));
        }
        if provider.refresh_cran(package)? {
            processed.push(format!("cran:{}", package));
        } else {
            eprintln!("warning: {} not found on CRAN", package);
        }
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    for release in bioc_releases {
        if let Some(bar) = &progress {
            bar.set_message(format!("Bioconductor {}", release));
        }
        provider.refresh_bioc_release(release)?;
        processed.push(format!("bioc:{}", release));
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if let Some(manifest) = &manifest {
        let requirements = manifest.requirements(None)?;
        for requirement in &requirements {
            // GitHub refs only enter via roots, so refresh them here; the
            // closure walk below covers CRAN and Bioconductor.
            if requirement.package.source == Source::Github {
                if let Some(locator) = &requirement.package.locator {
                    if !provider.refresh_github(locator)? && !requirement.optional {
                        eprintln!("warning: no DESCRIPTION found for {}", locator);
                    }
                }
            }
        }
        let primed = provider.prime_closure(&requirements, manifest.options.include_optional)?;
        processed.extend(primed);
    }

    if processed.is_empty() {
        println!("No cache entries updated.");
    } else {
        println!("Primed cache entries:");
        for item in &processed {
            println!("  - {}", item);
        }
    }
    Ok(())
}
