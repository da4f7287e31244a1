// src/repository/cache.rs

//! On-disk JSON metadata cache
//!
//! Layout: `<root>/cran/<pkg>.json`, `<root>/bioconductor/<release>.json`,
//! `<root>/github/<owner>__<repo>__<sha>.json`. The cache is the backing
//! store the resolver's provider reads from after `update-cache` has primed
//! it; a fetch falls back to the network only when a key is absent.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Slashes in cache keys (github slugs) become double underscores on disk
fn sanitize(segment: &str) -> String {
    segment.replace('/', "__")
}

/// File-per-key JSON cache rooted at a directory
#[derive(Debug, Clone)]
pub struct MetadataCache {
    root: PathBuf,
}

impl MetadataCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, namespace: &str, key: &str) -> PathBuf {
        self.root
            .join(sanitize(namespace))
            .join(format!("{}.json", sanitize(key)))
    }

    /// Load a cached document, or None when the key has never been stored
    pub fn load(&self, namespace: &str, key: &str) -> Result<Option<Value>> {
        let path = self.path(namespace, key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::IoError(format!("failed to read {}: {}", path.display(), e)))?;
        let value = serde_json::from_str(&raw).map_err(|e| {
            Error::IoError(format!("corrupt cache file {}: {}", path.display(), e))
        })?;
        debug!("cache hit for {}/{}", namespace, key);
        Ok(Some(value))
    }

    /// Store a document, creating parent directories as needed
    pub fn store(&self, namespace: &str, key: &str, value: &Value) -> Result<()> {
        let path = self.path(namespace, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
        let raw = serde_json::to_string_pretty(value)
            .map_err(|e| Error::IoError(format!("failed to serialize cache entry: {}", e)))?;
        fs::write(&path, raw)
            .map_err(|e| Error::IoError(format!("failed to write {}: {}", path.display(), e)))?;
        debug!("cached {}/{}", namespace, key);
        Ok(())
    }

    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.path(namespace, key).exists()
    }
}
