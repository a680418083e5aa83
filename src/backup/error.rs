//! Error types for backup runs.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;
use crate::resolver::ResolveError;

/// Run-level failures. Any of these aborts the backup.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Filesystem error on a backup directory, list file or report.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The repo-list file had no usable reference.
    #[error(
        "no repository references in {path}\n  Suggestion: add one ID, clone URL or path per line (lines starting with '#' are ignored)"
    )]
    NoReferences {
        /// The repo-list file.
        path: PathBuf,
    },

    /// No reference could be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The project catalog could not be listed.
    #[error("failed to list projects: {source}")]
    Catalog {
        /// The underlying API error.
        #[source]
        source: ApiError,
    },

    /// A report could not be serialized.
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        /// The report path.
        path: PathBuf,
        /// The serializer error.
        #[source]
        source: serde_json::Error,
    },
}

impl BackupError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a catalog error.
    pub fn catalog(source: ApiError) -> Self {
        Self::Catalog { source }
    }
}
