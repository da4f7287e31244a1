// src/report.rs

//! Report rendering for resolution results
//!
//! Two formats: a human-readable plan and a JSON document with the shape
//! `{ r_version, recommended_r, packages, downgrades, conflicts }`.

use crate::error::Error;
use crate::resolver::{format_chain, Solution};
use crate::version::RVersion;
use serde_json::json;

/// Known R releases, oldest first; used to suggest a concrete runtime
const SUPPORTED_R_VERSIONS: &[&str] = &[
    "3.6.0", "3.6.3", "4.0.0", "4.0.2", "4.0.5", "4.1.0", "4.1.2", "4.1.3", "4.2.0", "4.2.1",
    "4.2.2", "4.2.3", "4.3.0", "4.3.1", "4.3.2", "4.3.3", "4.4.0", "4.4.1",
];

/// Newest known R release satisfying the solution's floor
///
/// The floor is a minimum; any newer release works, so the recommendation is
/// the latest known one (or the floor itself when it is newer than the
/// table).
pub fn recommended_r(solution: &Solution) -> Option<RVersion> {
    let latest = SUPPORTED_R_VERSIONS
        .last()
        .map(|raw| RVersion::parse(raw).expect("supported R versions are valid"))?;
    match &solution.r_version {
        Some(minimum) if *minimum > latest => Some(minimum.clone()),
        Some(_) | None => Some(latest),
    }
}

/// Render the human-readable plan
pub fn render_human(project: &str, solution: &Solution) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Environment for {}:", project));
    match &solution.r_version {
        Some(r_version) => lines.push(format!("R {}", r_version)),
        None => lines.push("R (unconstrained)".to_string()),
    }
    if let Some(recommended) = recommended_r(solution) {
        if Some(&recommended) != solution.r_version.as_ref() {
            lines.push(format!("  recommended release: {}", recommended));
        }
    }

    for (name, candidate) in &solution.assignment {
        let mut extras = Vec::new();
        if let Some(release) = &candidate.bioc_release {
            extras.push(format!("Bioconductor {}", release));
        }
        if let Some(floor) = &candidate.r_floor {
            extras.push(format!("needs R >= {}", floor));
        }
        let meta = if extras.is_empty() {
            String::new()
        } else {
            format!(" ({})", extras.join(", "))
        };
        lines.push(format!(
            "  - {} {} [{}]{}",
            name, candidate.version, candidate.package.source, meta
        ));
    }

    let summary = &solution.source_summary;
    lines.push(format!(
        "{} packages ({} CRAN, {} Bioconductor, {} GitHub)",
        solution.assignment.len(),
        summary.cran,
        summary.bioc,
        summary.github
    ));

    if !solution.downgrades.is_empty() {
        lines.push("Version adjustments:".to_string());
        for entry in &solution.downgrades {
            lines.push(format!(
                "  - {}: {} -> {} ({})",
                entry.name, entry.from, entry.to, entry.reason
            ));
        }
    }

    lines.join("\n")
}

/// Render the JSON report
pub fn render_json(solution: &Solution, include_optional: bool) -> String {
    let packages: Vec<_> = solution
        .assignment
        .iter()
        .map(|(name, candidate)| {
            json!({
                "name": name,
                "source": candidate.package.source.as_str(),
                "version": candidate.version.to_string(),
                "depends_on": solution.depends_on(name, include_optional),
            })
        })
        .collect();

    let payload = json!({
        "r_version": solution.r_version.as_ref().map(|v| v.to_string()),
        "recommended_r": recommended_r(solution).map(|v| v.to_string()),
        "packages": packages,
        "downgrades": &solution.downgrades,
        "conflicts": [],
    });

    serde_json::to_string_pretty(&payload).expect("report serializes")
}

/// Render a resolution failure as JSON with the same top-level shape
pub fn render_conflict_json(error: &Error) -> String {
    let conflict = match error {
        Error::VersionConflict { name, detail, chain } => json!({
            "kind": "version_conflict",
            "package": name,
            "detail": detail,
            "chain": format_chain(chain),
        }),
        Error::SourceConflict { name, first, second } => json!({
            "kind": "source_conflict",
            "package": name,
            "detail": format!("requested from both {} and {}", first, second),
        }),
        Error::RLockUnsatisfiable { name, lock, floor } => json!({
            "kind": "r_lock_unsatisfiable",
            "package": name,
            "detail": format!("requires R >= {} but R is locked to {}", floor, lock),
        }),
        other => json!({
            "kind": "error",
            "detail": other.to_string(),
        }),
    };

    let payload = json!({
        "r_version": null,
        "recommended_r": null,
        "packages": [],
        "downgrades": [],
        "conflicts": [conflict],
    });
    serde_json::to_string_pretty(&payload).expect("report serializes")
}
