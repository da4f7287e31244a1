// src/repository/cran.rs

//! CRAN metadata via the crandb mirror
//!
//! crandb serves the full version history of a package as one JSON document
//! at `/{package}/all`, including archived releases. Each version record
//! carries the DESCRIPTION fields this crate needs (`Depends`, `Imports`,
//! `LinkingTo`, `Suggests`).

use crate::error::Result;
use crate::metadata::{candidate_from_cran, Candidate};
use serde_json::Value;
use tracing::debug;

use super::client::HttpClient;

const CRANDB_URL: &str = "https://crandb.r-pkg.org";

/// Fetch the crandb record for one package (all versions)
///
/// Returns None when crandb does not know the package.
pub fn fetch_cran_record(client: &HttpClient, package: &str) -> Result<Option<Value>> {
    let url = format!("{}/{}/all", CRANDB_URL, package);
    client.get_json_opt(&url, None)
}

/// Normalize a crandb record into candidates, newest version first
pub fn candidates_from_record(package: &str, record: &Value) -> Result<Vec<Candidate>> {
    let versions = match record.get("versions").and_then(Value::as_object) {
        Some(versions) => versions,
        None => {
            debug!("crandb record for {} has no versions table", package);
            return Ok(Vec::new());
        }
    };

    let mut candidates = Vec::with_capacity(versions.len());
    for (version, payload) in versions {
        candidates.push(candidate_from_cran(package, version, payload)?);
    }
    candidates.sort_by(|a, b| b.version.cmp(&a.version));
    Ok(candidates)
}
