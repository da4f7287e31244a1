// src/resolver/solution.rs

//! Resolution result data structures

use crate::metadata::{Candidate, Source};
use crate::version::RVersion;
use serde::Serialize;
use std::collections::BTreeMap;

/// The resolved assignment plus the derived R-version verdict
///
/// A solution is a snapshot: it is never mutated after construction.
/// Serialization to the report formats lives in `crate::report`.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Exactly one candidate per resolved package name
    pub assignment: BTreeMap<String, Candidate>,
    /// Chosen R runtime version; None when nothing constrains it
    pub r_version: Option<RVersion>,
    /// Version pins forced down by an R ceiling, and R raises forced by floors
    pub downgrades: Vec<DowngradeEntry>,
    pub source_summary: SourceSummary,
}

impl Solution {
    /// Names of resolved dependencies of `name`, restricted to the assignment
    pub fn depends_on(&self, name: &str, include_optional: bool) -> Vec<String> {
        match self.assignment.get(name) {
            Some(candidate) => {
                let mut deps: Vec<String> = candidate
                    .active_edges(include_optional)
                    .filter(|edge| self.assignment.contains_key(&edge.name))
                    .map(|edge| edge.name.clone())
                    .collect();
                deps.sort();
                deps.dedup();
                deps
            }
            None => Vec::new(),
        }
    }
}

/// One entry of the downgrade/upgrade report
///
/// `from`/`to` are package versions when an R ceiling forced a lower pin, and
/// R versions when a package floor forced the runtime up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DowngradeEntry {
    pub name: String,
    pub from: String,
    pub to: String,
    pub reason: String,
}

/// How many selections came from each source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub cran: usize,
    pub bioc: usize,
    pub github: usize,
}

impl SourceSummary {
    pub fn tally<'a>(candidates: impl Iterator<Item = &'a Candidate>) -> Self {
        let mut summary = Self::default();
        for candidate in candidates {
            match candidate.package.source {
                Source::Cran => summary.cran += 1,
                Source::Bioc => summary.bioc += 1,
                Source::Github => summary.github += 1,
            }
        }
        summary
    }
}
