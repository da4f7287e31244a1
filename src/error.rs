// src/error.rs

//! Central error type for rverflow
//!
//! All fallible operations in the library return `crate::error::Result`.
//! Resolution dead-ends are handled internally by the resolver; only the
//! aggregate conflict kinds below escape to callers.

use crate::resolver::BlameLink;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Version string did not match `\d+([.\-]\d+)*([.\-][A-Za-z0-9]+)?`
    #[error("malformed version '{0}'")]
    MalformedVersion(String),

    /// Constraint expression could not be parsed
    #[error("malformed constraint '{0}'")]
    MalformedConstraint(String),

    /// A ref that was explicitly requested has no candidates at its source
    #[error("package '{name}' not found in {source_name}")]
    UnknownPackage { name: String, source_name: String },

    /// The source was unreachable and no cached data exists
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// Two roots pin the same name to different sources
    #[error("source conflict: '{name}' requested from both {first} and {second}")]
    SourceConflict {
        name: String,
        first: String,
        second: String,
    },

    /// No candidate satisfies the accumulated constraint for some name
    #[error("version conflict on '{name}': {detail}")]
    VersionConflict {
        name: String,
        detail: String,
        chain: Vec<BlameLink>,
    },

    /// A locked R version forbids a required floor
    #[error("R lock {lock} unsatisfiable: '{name}' requires R >= {floor}")]
    RLockUnsatisfiable {
        name: String,
        lock: String,
        floor: String,
    },

    /// Cooperative cancellation fired during the search
    #[error("resolution cancelled")]
    Cancelled,

    /// Project manifest is missing or invalid
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Filesystem failure around the metadata cache
    #[error("I/O error: {0}")]
    IoError(String),
}

impl Error {
    /// Exit code for the CLI: 1 resolution conflict, 2 manifest error,
    /// 3 metadata fetch failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::SourceConflict { .. }
            | Error::VersionConflict { .. }
            | Error::RLockUnsatisfiable { .. }
            | Error::Cancelled => 1,
            Error::MalformedVersion(_)
            | Error::MalformedConstraint(_)
            | Error::InvalidManifest(_) => 2,
            Error::UnknownPackage { .. } | Error::MetadataUnavailable(_) | Error::IoError(_) => 3,
        }
    }
}
