// src/lib.rs

//! rverflow
//!
//! Resolves compatible R package version sets across CRAN, Bioconductor, and
//! GitHub, producing an installable environment specification (package →
//! version pins plus the minimum/recommended R runtime) before anything is
//! installed.
//!
//! # Architecture
//!
//! - Metadata-first: repository responses are normalized into one candidate
//!   model and cached as JSON on disk
//! - The resolver is a synchronous backtracking search over that model; it
//!   performs no I/O of its own
//! - Sources are tagged identities: the same name on CRAN, in a Bioconductor
//!   release, or on GitHub are distinct refs, and a solution selects one

mod error;
pub mod metadata;
pub mod project;
pub mod report;
pub mod repository;
pub mod resolver;
pub mod version;

pub use error::{Error, Result};
pub use metadata::{
    Candidate, DependencyEdge, EdgeKind, MetadataProvider, PackageRef, Requirement, Source,
};
pub use project::ProjectManifest;
pub use repository::RepositoryProvider;
pub use resolver::{BlameLink, DowngradeEntry, ResolveOptions, Resolver, Solution, SourceSummary};
pub use version::{Constraint, ConstraintOp, Predicate, RVersion};
