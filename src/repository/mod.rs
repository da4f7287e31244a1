// src/repository/mod.rs

//! Repository access: fetchers, on-disk cache, and the concrete provider
//!
//! `RepositoryProvider` implements `MetadataProvider` over the three
//! upstream sources. Every fetched document lands in the on-disk cache and
//! an in-process memo, so the resolver sees pure, repeatable responses and
//! `solve` works offline once `update-cache` has primed the store.

pub mod bioconductor;
pub mod cache;
pub mod client;
pub mod cran;
pub mod github;

pub use cache::MetadataCache;
pub use client::HttpClient;
pub use github::GithubSlug;

use crate::error::{Error, Result};
use crate::metadata::{
    candidate_from_bioc, candidate_from_description, is_base_package, parse_description,
    Candidate, MetadataProvider, PackageRef, Requirement, Source,
};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use tracing::{debug, info};

/// Metadata provider backed by the on-disk cache and the public repositories
pub struct RepositoryProvider {
    client: HttpClient,
    cache: MetadataCache,
    prefer_bioc_release: Option<String>,
    github_token: Option<String>,
    memo: RefCell<BTreeMap<PackageRef, Vec<Candidate>>>,
}

impl RepositoryProvider {
    pub fn new(
        cache_root: impl AsRef<Path>,
        prefer_bioc_release: Option<String>,
        github_token: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            cache: MetadataCache::new(cache_root.as_ref()),
            prefer_bioc_release,
            github_token,
            memo: RefCell::new(BTreeMap::new()),
        })
    }

    /// Release to consult when a bioc ref carries no explicit one
    fn bioc_release_for(&self, package: &PackageRef) -> String {
        package
            .locator
            .clone()
            .or_else(|| self.prefer_bioc_release.clone())
            .unwrap_or_else(|| bioconductor::latest_release().to_string())
    }

    fn cran_record(&self, name: &str, force_fetch: bool) -> Result<Option<Value>> {
        if !force_fetch {
            if let Some(record) = self.cache.load("cran", name)? {
                return Ok(Some(record));
            }
        }
        match cran::fetch_cran_record(&self.client, name)? {
            Some(record) => {
                self.cache.store("cran", name, &record)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn bioc_manifest(&self, release: &str, force_fetch: bool) -> Result<Value> {
        if !force_fetch {
            if let Some(manifest) = self.cache.load("bioconductor", release)? {
                return Ok(manifest);
            }
        }
        let manifest = bioconductor::fetch_release_manifest(&self.client, release)?;
        self.cache.store("bioconductor", release, &manifest)?;
        Ok(manifest)
    }

    fn github_payload(&self, locator: &str, force_fetch: bool) -> Result<Option<Value>> {
        if !force_fetch {
            if let Some(payload) = self.cache.load("github", locator)? {
                return Ok(Some(payload));
            }
        }
        let slug = GithubSlug::parse(locator)?;
        match github::fetch_github_description(&self.client, &slug, self.github_token.as_deref())? {
            Some(payload) => {
                self.cache.store("github", locator, &payload)?;
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    fn lookup(&self, package: &PackageRef) -> Result<Vec<Candidate>> {
        match package.source {
            Source::Cran => match self.cran_record(&package.name, false)? {
                Some(record) => cran::candidates_from_record(&package.name, &record),
                None => Ok(Vec::new()),
            },
            Source::Bioc => {
                let release = self.bioc_release_for(package);
                let manifest = self.bioc_manifest(&release, false)?;
                match manifest.get(&package.name) {
                    Some(payload) => {
                        let floor = bioconductor::release_r_floor(&release);
                        let candidate = candidate_from_bioc(
                            &package.name,
                            payload,
                            &release,
                            floor.as_ref(),
                        )?;
                        Ok(vec![candidate])
                    }
                    None => Ok(Vec::new()),
                }
            }
            Source::Github => {
                let locator = package.locator.as_deref().ok_or_else(|| {
                    Error::InvalidManifest(format!(
                        "GitHub package '{}' has no owner/repo locator",
                        package.name
                    ))
                })?;
                match self.github_payload(locator, false)? {
                    Some(payload) => {
                        let description = payload
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        let fields = parse_description(description);
                        let slug = GithubSlug::parse(locator)?;
                        let candidate = candidate_from_description(
                            &fields,
                            &slug.slug(),
                            slug.git_ref.as_deref(),
                        )?;
                        Ok(vec![candidate])
                    }
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    /// Force-refresh the cached crandb record for one package
    pub fn refresh_cran(&self, name: &str) -> Result<bool> {
        self.memo.borrow_mut().remove(&PackageRef::cran(name));
        Ok(self.cran_record(name, true)?.is_some())
    }

    /// Force-refresh the cached manifest for one Bioconductor release
    pub fn refresh_bioc_release(&self, release: &str) -> Result<()> {
        self.memo.borrow_mut().clear();
        self.bioc_manifest(release, true)?;
        Ok(())
    }

    /// Force-refresh the cached DESCRIPTION for one GitHub locator
    pub fn refresh_github(&self, locator: &str) -> Result<bool> {
        self.memo.borrow_mut().clear();
        Ok(self.github_payload(locator, true)?.is_some())
    }

    /// Prime the cache for every root and, transitively, every edge
    ///
    /// Walks breadth-first from the requirements, fetching any record that
    /// is not cached yet. Edges route like the resolver: a Bioconductor
    /// parent keeps its dependencies in the same release (one manifest fetch
    /// covers them all), everything else is looked up on CRAN.
    pub fn prime_closure(
        &self,
        requirements: &[Requirement],
        include_optional: bool,
    ) -> Result<Vec<String>> {
        let mut primed = Vec::new();
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<PackageRef> = VecDeque::new();

        for requirement in requirements {
            queue.push_back(requirement.package.clone());
        }

        while let Some(package) = queue.pop_front() {
            let key = format!("{}", package);
            if !visited.insert(key.clone()) {
                continue;
            }

            let candidates = self.candidates(&package)?;
            if candidates.is_empty() {
                // Mirror the resolver's routing: a name missing from a
                // release falls back to CRAN.
                if package.source == Source::Bioc {
                    queue.push_back(PackageRef::cran(&package.name));
                } else {
                    debug!("nothing to prime for {}", package);
                }
                continue;
            }
            info!("primed {}", package);
            primed.push(key);

            // Walk the most preferred candidate; anything the search reaches
            // by backtracking to older versions falls back to a live fetch.
            if let Some(candidate) = candidates.first() {
                for edge in candidate.active_edges(include_optional) {
                    if is_base_package(&edge.name) {
                        continue;
                    }
                    let next = match &candidate.bioc_release {
                        Some(release) => PackageRef::bioc(&edge.name, release.clone()),
                        None => PackageRef::cran(&edge.name),
                    };
                    queue.push_back(next);
                }
            }
        }

        Ok(primed)
    }
}

impl MetadataProvider for RepositoryProvider {
    fn candidates(&self, package: &PackageRef) -> Result<Vec<Candidate>> {
        if let Some(hit) = self.memo.borrow().get(package) {
            return Ok(hit.clone());
        }

        let candidates = self.lookup(package)?;

        let mut memo = self.memo.borrow_mut();
        // A GitHub query keyed by slug answers for the DESCRIPTION's real
        // package name too; memoize both so re-queries stay offline.
        if let Some(first) = candidates.first() {
            if first.package != *package {
                memo.insert(first.package.clone(), candidates.clone());
            }
        }
        memo.insert(package.clone(), candidates.clone());
        Ok(candidates)
    }
}
