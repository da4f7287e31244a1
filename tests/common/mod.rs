// tests/common/mod.rs

//! Shared test utilities for integration tests.

use rverflow::{
    Candidate, Constraint, DependencyEdge, EdgeKind, MetadataProvider, PackageRef, Requirement,
    RVersion,
};
use std::collections::BTreeMap;

pub fn v(s: &str) -> RVersion {
    RVersion::parse(s).unwrap()
}

pub fn c(s: &str) -> Constraint {
    Constraint::parse(s).unwrap()
}

/// In-memory provider; candidates come back in insertion order, so insert
/// newest first as the real providers do.
#[derive(Default)]
pub struct StaticProvider {
    records: BTreeMap<PackageRef, Vec<Candidate>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, candidate: Candidate) -> &mut Self {
        self.records
            .entry(candidate.package.clone())
            .or_default()
            .push(candidate);
        self
    }
}

impl MetadataProvider for StaticProvider {
    fn candidates(&self, package: &PackageRef) -> rverflow::Result<Vec<Candidate>> {
        if let Some(hit) = self.records.get(package) {
            return Ok(hit.clone());
        }
        // GitHub lookups key on the locator, as the real provider does: the
        // manifest knows the slug before it knows the DESCRIPTION name.
        if package.source == rverflow::Source::Github {
            for (key, candidates) in &self.records {
                if key.source == rverflow::Source::Github && key.locator == package.locator {
                    return Ok(candidates.clone());
                }
            }
        }
        Ok(Vec::new())
    }
}

/// A CRAN candidate with Imports edges
pub fn cran(name: &str, version: &str, deps: &[(&str, &str)]) -> Candidate {
    Candidate {
        package: PackageRef::cran(name),
        version: v(version),
        r_floor: None,
        depends: deps
            .iter()
            .map(|(dep, constraint)| DependencyEdge {
                name: dep.to_string(),
                constraint: c(constraint),
                kind: EdgeKind::Imports,
            })
            .collect(),
        bioc_release: None,
    }
}

/// A Bioconductor candidate pinned to a release
pub fn bioc(name: &str, version: &str, release: &str, floor: &str, deps: &[(&str, &str)]) -> Candidate {
    Candidate {
        package: PackageRef::bioc(name, release),
        version: v(version),
        r_floor: Some(v(floor)),
        depends: deps
            .iter()
            .map(|(dep, constraint)| DependencyEdge {
                name: dep.to_string(),
                constraint: c(constraint),
                kind: EdgeKind::Imports,
            })
            .collect(),
        bioc_release: Some(release.to_string()),
    }
}

pub fn with_floor(mut candidate: Candidate, floor: &str) -> Candidate {
    candidate.r_floor = Some(v(floor));
    candidate
}

/// A non-optional CRAN root requirement
pub fn root(name: &str, constraint: &str) -> Requirement {
    Requirement {
        package: PackageRef::cran(name),
        constraint: c(constraint),
        optional: false,
    }
}
