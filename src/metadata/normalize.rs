// src/metadata/normalize.rs

//! Normalize repository payloads into candidates
//!
//! crandb records, Bioconductor release manifests, and GitHub DESCRIPTION
//! files all declare dependencies differently (JSON objects keyed by package,
//! comma-separated field strings). This module flattens all three into
//! `Candidate` values, splits the `R (>= X)` entry out as the R floor, and
//! drops edges to R's bundled base packages.

use crate::error::{Error, Result};
use crate::metadata::{Candidate, DependencyEdge, EdgeKind, PackageRef};
use crate::version::{Constraint, ConstraintOp, RVersion};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// Packages bundled with every R installation; edges to these are noise
const BASE_R_PACKAGES: &[&str] = &[
    "base", "compiler", "datasets", "graphics", "grDevices", "grid", "methods", "parallel",
    "splines", "stats", "stats4", "tcltk", "tools", "utils",
];

/// True for packages shipped with the R runtime itself
pub fn is_base_package(name: &str) -> bool {
    BASE_R_PACKAGES.contains(&name)
}

fn dependency_entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<name>[A-Za-z0-9._]+)(?:\s*\((?P<constraint>[^)]+)\))?$")
            .expect("dependency entry regex is valid")
    })
}

/// Parse one `name (>= 1.0)` entry from a dependency field
fn parse_dependency_entry(entry: &str) -> Option<(String, Constraint)> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    let captures = match dependency_entry_re().captures(entry) {
        Some(captures) => captures,
        None => {
            debug!("skipping unparseable dependency entry '{}'", entry);
            return None;
        }
    };
    let name = captures["name"].to_string();
    let constraint = match captures.name("constraint") {
        Some(expr) => parse_field_constraint(expr.as_str()),
        None => Constraint::any(),
    };
    Some((name, constraint))
}

/// Constraint expressions inside repository metadata are best-effort: real
/// records contain the occasional typo and a bad upstream field must not
/// poison the whole candidate list.
fn parse_field_constraint(expr: &str) -> Constraint {
    let expr = expr.trim();
    if expr.is_empty() || expr == "*" {
        return Constraint::any();
    }
    match Constraint::parse(expr) {
        Ok(constraint) => constraint,
        Err(_) => {
            debug!("treating unparseable constraint '{}' as unconstrained", expr);
            Constraint::any()
        }
    }
}

/// Parse one dependency field (`Depends`, `Imports`, ...) of a JSON payload
///
/// crandb encodes fields as objects mapping package name to constraint
/// string; DESCRIPTION-derived payloads carry comma-separated strings. Both
/// shapes are accepted.
pub fn parse_dependency_field(section: &Value, kind: EdgeKind) -> Vec<DependencyEdge> {
    let mut edges = Vec::new();
    match section {
        Value::Object(map) => {
            for (name, spec) in map {
                let constraint = match spec {
                    Value::String(s) => parse_field_constraint(s),
                    _ => parse_field_constraint(&spec.to_string()),
                };
                edges.push(DependencyEdge {
                    name: name.clone(),
                    constraint,
                    kind,
                });
            }
        }
        Value::String(s) => {
            for entry in s.split(',') {
                if let Some((name, constraint)) = parse_dependency_entry(entry) {
                    edges.push(DependencyEdge {
                        name,
                        constraint,
                        kind,
                    });
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                if let Value::String(s) = entry {
                    if let Some((name, constraint)) = parse_dependency_entry(s) {
                        edges.push(DependencyEdge {
                            name,
                            constraint,
                            kind,
                        });
                    }
                }
            }
        }
        _ => {}
    }
    edges
}

/// Split the `R` pseudo-dependency out of an edge list
///
/// Returns the tightest declared lower bound on R (from `>=`/`>` predicates)
/// and the remaining edges with base packages filtered out.
pub fn split_r_floor(edges: Vec<DependencyEdge>) -> (Option<RVersion>, Vec<DependencyEdge>) {
    let mut floor: Option<RVersion> = None;
    let mut remaining = Vec::with_capacity(edges.len());

    for edge in edges {
        if edge.name == "R" {
            for predicate in edge.constraint.predicates() {
                match predicate.op {
                    ConstraintOp::GreaterOrEqual | ConstraintOp::GreaterThan => {
                        let bound = predicate.version.clone();
                        floor = Some(match floor.take() {
                            Some(current) if current >= bound => current,
                            _ => bound,
                        });
                    }
                    _ => {}
                }
            }
            continue;
        }
        if is_base_package(&edge.name) {
            continue;
        }
        remaining.push(edge);
    }

    (floor, remaining)
}

/// Collect edges from the four dependency fields of a JSON payload
fn edges_from_payload(payload: &Value) -> Vec<DependencyEdge> {
    let mut edges = Vec::new();
    for (field, kind) in [
        ("Depends", EdgeKind::Depends),
        ("Imports", EdgeKind::Imports),
        ("LinkingTo", EdgeKind::LinkingTo),
        ("Suggests", EdgeKind::Suggests),
    ] {
        if let Some(section) = payload.get(field) {
            edges.extend(parse_dependency_field(section, kind));
        }
    }
    edges
}

/// Normalize one version record of a crandb `/{package}/all` response
pub fn candidate_from_cran(name: &str, version: &str, payload: &Value) -> Result<Candidate> {
    let version = RVersion::parse(version)?;
    let (r_floor, depends) = split_r_floor(edges_from_payload(payload));
    Ok(Candidate {
        package: PackageRef::cran(name),
        version,
        r_floor,
        depends,
        bioc_release: None,
    })
}

/// Normalize one package entry of a Bioconductor release manifest
///
/// `release_floor` is the R series the release as a whole targets; a package
/// declaring a higher `Depends: R (>= ...)` raises the floor further.
pub fn candidate_from_bioc(
    name: &str,
    payload: &Value,
    release: &str,
    release_floor: Option<&RVersion>,
) -> Result<Candidate> {
    let version = payload
        .get("Version")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::MetadataUnavailable(format!(
                "Bioconductor record for {} in release {} has no Version",
                name, release
            ))
        })?;
    let version = RVersion::parse(version)?;
    let (declared_floor, depends) = split_r_floor(edges_from_payload(payload));

    let r_floor = match (release_floor, declared_floor) {
        (Some(release_r), Some(declared)) if declared > *release_r => Some(declared),
        (Some(release_r), _) => Some(release_r.clone()),
        (None, declared) => declared,
    };

    Ok(Candidate {
        package: PackageRef::bioc(name, release),
        version,
        r_floor,
        depends,
        bioc_release: Some(release.to_string()),
    })
}

/// Normalize a parsed DESCRIPTION (GitHub) into its single candidate
pub fn candidate_from_description(
    fields: &BTreeMap<String, String>,
    slug: &str,
    git_ref: Option<&str>,
) -> Result<Candidate> {
    let name = fields.get("Package").ok_or_else(|| {
        Error::MetadataUnavailable(format!("DESCRIPTION for {} has no Package field", slug))
    })?;
    let version = fields
        .get("Version")
        .map(String::as_str)
        .unwrap_or("0.0.0");
    let version = RVersion::parse(version)?;

    let mut edges = Vec::new();
    for (field, kind) in [
        ("Depends", EdgeKind::Depends),
        ("Imports", EdgeKind::Imports),
        ("LinkingTo", EdgeKind::LinkingTo),
        ("Suggests", EdgeKind::Suggests),
    ] {
        if let Some(value) = fields.get(field) {
            edges.extend(parse_dependency_field(&Value::String(value.clone()), kind));
        }
    }
    let (r_floor, depends) = split_r_floor(edges);

    let locator = match git_ref {
        Some(git_ref) => format!("{}@{}", slug, git_ref),
        None => slug.to_string(),
    };

    Ok(Candidate {
        package: PackageRef::github(name.clone(), locator),
        version,
        r_floor,
        depends,
        bioc_release: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(s: &str) -> RVersion {
        RVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_dependency_field_object() {
        let section = json!({"rlang": ">= 1.1.0", "cli": "*"});
        let mut edges = parse_dependency_field(&section, EdgeKind::Imports);
        edges.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].name, "cli");
        assert!(edges[0].constraint.is_any());
        assert_eq!(edges[1].name, "rlang");
        assert!(edges[1].constraint.satisfies(&v("1.1.0")));
        assert!(!edges[1].constraint.satisfies(&v("1.0.0")));
    }

    #[test]
    fn test_parse_dependency_field_string() {
        let section = json!("cli (>= 3.4.0), generics, glue (>= 1.3.2)");
        let edges = parse_dependency_field(&section, EdgeKind::Imports);
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].name, "cli");
        assert_eq!(edges[1].name, "generics");
        assert!(edges[1].constraint.is_any());
    }

    #[test]
    fn test_bad_entry_is_skipped() {
        let section = json!("good (>= 1.0), not a package!!, other");
        let edges = parse_dependency_field(&section, EdgeKind::Depends);
        let names: Vec<&str> = edges.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["good", "other"]);
    }

    #[test]
    fn test_split_r_floor_takes_tightest_bound() {
        let edges = parse_dependency_field(
            &json!({"R": ">= 4.1.0", "stats": "*", "rlang": ">= 1.0"}),
            EdgeKind::Depends,
        );
        let (floor, remaining) = split_r_floor(edges);
        assert_eq!(floor, Some(v("4.1.0")));
        // "stats" is a base package and "R" is the floor, only rlang survives
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "rlang");
    }

    #[test]
    fn test_split_r_floor_ignores_upper_bounds() {
        let edges = parse_dependency_field(&json!({"R": "< 5.0"}), EdgeKind::Depends);
        let (floor, _) = split_r_floor(edges);
        assert_eq!(floor, None);
    }

    #[test]
    fn test_candidate_from_cran() {
        let payload = json!({
            "Depends": {"R": ">= 3.5.0"},
            "Imports": {"rlang": ">= 1.1.0", "utils": "*"},
            "Suggests": {"testthat": ">= 3.0.0"}
        });
        let candidate = candidate_from_cran("dplyr", "1.1.4", &payload).unwrap();
        assert_eq!(candidate.version, v("1.1.4"));
        assert_eq!(candidate.r_floor, Some(v("3.5.0")));
        assert_eq!(candidate.package, PackageRef::cran("dplyr"));
        let active: Vec<&str> = candidate
            .active_edges(false)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(active, vec!["rlang"]);
        let with_optional: Vec<&str> = candidate
            .active_edges(true)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(with_optional, vec!["rlang", "testthat"]);
    }

    #[test]
    fn test_candidate_from_bioc_release_floor_wins() {
        let payload = json!({"Version": "1.42.0", "Depends": {"R": ">= 4.0.0"}});
        let release_floor = v("4.4");
        let candidate =
            candidate_from_bioc("DESeq2", &payload, "3.19", Some(&release_floor)).unwrap();
        assert_eq!(candidate.r_floor, Some(v("4.4")));
        assert_eq!(candidate.bioc_release.as_deref(), Some("3.19"));
    }

    #[test]
    fn test_candidate_from_bioc_declared_floor_can_raise() {
        let payload = json!({"Version": "2.0.1", "Depends": {"R": ">= 4.4.1"}});
        let release_floor = v("4.4");
        let candidate =
            candidate_from_bioc("scran", &payload, "3.19", Some(&release_floor)).unwrap();
        assert_eq!(candidate.r_floor, Some(v("4.4.1")));
    }

    #[test]
    fn test_candidate_from_description() {
        let raw = "Package: ggplot2\nVersion: 3.5.0.9000\nDepends: R (>= 4.0)\nImports: rlang (>= 1.1.0), cli\n";
        let fields = crate::metadata::parse_description(raw);
        let candidate =
            candidate_from_description(&fields, "tidyverse/ggplot2", Some("main")).unwrap();
        assert_eq!(candidate.package.name, "ggplot2");
        assert_eq!(
            candidate.package.locator.as_deref(),
            Some("tidyverse/ggplot2@main")
        );
        assert_eq!(candidate.r_floor, Some(v("4.0")));
        assert_eq!(candidate.depends.len(), 2);
    }
}
