// src/metadata/mod.rs

//! Unified package-metadata model
//!
//! CRAN, Bioconductor, and GitHub expose three different metadata shapes;
//! everything downstream of the fetchers works with the normalized value
//! types in this module. All of them are immutable — the resolver keeps its
//! own mutable search state.

mod description;
mod normalize;

pub use description::parse_description;
pub use normalize::{
    candidate_from_bioc, candidate_from_cran, candidate_from_description, is_base_package,
    parse_dependency_field, split_r_floor,
};

use crate::error::Result;
use crate::version::{Constraint, RVersion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a package comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cran,
    Bioc,
    Github,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cran => "cran",
            Source::Bioc => "bioc",
            Source::Github => "github",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical identity of a package across sources
///
/// `locator` is the Bioconductor release for `bioc`, the `owner/repo[@ref]`
/// slug for `github`, and absent for `cran`. Two refs are equal iff all
/// three fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageRef {
    pub source: Source,
    pub name: String,
    pub locator: Option<String>,
}

impl PackageRef {
    pub fn cran(name: impl Into<String>) -> Self {
        Self {
            source: Source::Cran,
            name: name.into(),
            locator: None,
        }
    }

    pub fn bioc(name: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            source: Source::Bioc,
            name: name.into(),
            locator: Some(release.into()),
        }
    }

    pub fn github(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            source: Source::Github,
            name: name.into(),
            locator: Some(slug.into()),
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locator {
            Some(locator) => write!(f, "{}:{} ({})", self.source, self.name, locator),
            None => write!(f, "{}:{}", self.source, self.name),
        }
    }
}

/// The DESCRIPTION field a dependency edge was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Depends,
    Imports,
    LinkingTo,
    Suggests,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Depends => "Depends",
            EdgeKind::Imports => "Imports",
            EdgeKind::LinkingTo => "LinkingTo",
            EdgeKind::Suggests => "Suggests",
        }
    }

    /// Suggests edges only participate when the manifest opts in
    pub fn is_active(&self, include_optional: bool) -> bool {
        match self {
            EdgeKind::Suggests => include_optional,
            _ => true,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declared requirement from one package on another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub name: String,
    pub constraint: Constraint,
    pub kind: EdgeKind,
}

/// A concrete version of a package with its declared dependencies and R floor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub package: PackageRef,
    pub version: RVersion,
    /// Minimum R runtime this candidate declares (`Depends: R (>= X)`)
    pub r_floor: Option<RVersion>,
    pub depends: Vec<DependencyEdge>,
    pub bioc_release: Option<String>,
}

impl Candidate {
    /// Dependency edges whose kind participates in resolution
    pub fn active_edges(&self, include_optional: bool) -> impl Iterator<Item = &DependencyEdge> {
        self.depends
            .iter()
            .filter(move |edge| edge.kind.is_active(include_optional))
    }
}

/// A root requirement produced from one manifest target
#[derive(Debug, Clone)]
pub struct Requirement {
    pub package: PackageRef,
    pub constraint: Constraint,
    pub optional: bool,
}

/// Oracle that yields candidates for a package ref
///
/// Candidates come back in descending preference order (newest first for
/// CRAN; Bioconductor and GitHub pin by external identity and return at most
/// one). Implementations may cache internally; the resolver treats responses
/// as pure per ref.
pub trait MetadataProvider {
    fn candidates(&self, package: &PackageRef) -> Result<Vec<Candidate>>;
}
