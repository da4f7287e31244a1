// src/repository/bioconductor.rs

//! Bioconductor release manifests
//!
//! Bioconductor is release-pinned: a release names exactly one version of
//! every package it carries, and the release as a whole targets one R
//! series. A release manifest here is the union of the per-category
//! `packages.json` indexes; categories missing from old releases are
//! skipped.

use crate::error::{Error, Result};
use crate::version::RVersion;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::client::HttpClient;

const BIOC_URL: &str = "https://bioconductor.org/packages/json";

const BIOC_CATEGORIES: &[&str] = &["bioc", "data/annotation", "data/experiment", "workflows"];

/// Release → R series each Bioconductor release is built against
const BIOC_R_MATRIX: &[(&str, &str)] = &[
    ("3.12", "4.0"),
    ("3.13", "4.1"),
    ("3.14", "4.1"),
    ("3.15", "4.2"),
    ("3.16", "4.2"),
    ("3.17", "4.3"),
    ("3.18", "4.3"),
    ("3.19", "4.4"),
];

/// R series a release requires, when the release is known
pub fn release_r_floor(release: &str) -> Option<RVersion> {
    BIOC_R_MATRIX
        .iter()
        .find(|(known, _)| *known == release)
        .map(|(_, r)| RVersion::parse(r).expect("release matrix versions are valid"))
}

/// Newest release in the matrix
pub fn latest_release() -> &'static str {
    BIOC_R_MATRIX
        .last()
        .map(|(release, _)| *release)
        .expect("release matrix is non-empty")
}

/// Fetch and aggregate the package index of one release
pub fn fetch_release_manifest(client: &HttpClient, release: &str) -> Result<Value> {
    let mut aggregated = Map::new();
    for category in BIOC_CATEGORIES {
        let url = format!("{}/{}/{}/packages.json", BIOC_URL, release, category);
        let index = match client.get_json(&url, None) {
            Ok(index) => index,
            Err(e) => {
                // Older releases do not publish every category.
                debug!("no {} index for release {}: {}", category, release, e);
                continue;
            }
        };
        if let Value::Object(packages) = index {
            for (name, payload) in packages {
                aggregated.insert(name, payload);
            }
        }
    }

    if aggregated.is_empty() {
        return Err(Error::MetadataUnavailable(format!(
            "no packages found for Bioconductor release {}",
            release
        )));
    }
    if release_r_floor(release).is_none() {
        warn!("unknown Bioconductor release {}, no R floor recorded", release);
    }
    Ok(Value::Object(aggregated))
}
