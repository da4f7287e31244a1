// src/resolver/mod.rs

//! Dependency resolution
//!
//! This module provides the backtracking search that reconciles version
//! constraints, per-package R-version floors, and cross-repository
//! preferences into one installable assignment.

mod conflict;
mod engine;
mod solution;

pub use conflict::{format_chain, BlameLink};
pub use engine::{ResolveOptions, Resolver};
pub use solution::{DowngradeEntry, Solution, SourceSummary};
