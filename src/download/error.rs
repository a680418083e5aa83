//! Error types for archive downloads.
//!
//! Every variant is scoped to a single project. None of them abort a run;
//! [`DownloadError::is_transient`] decides whether the attempt loop keeps
//! going.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur while downloading one archive.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The archive request failed (network, timeout or non-2xx status).
    #[error("archive request failed: {source}")]
    Request {
        /// The underlying API error.
        #[source]
        source: ApiError,
    },

    /// The response body broke off while being read.
    #[error("error reading archive body from {url}: {source}")]
    Stream {
        /// The archive URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered 2xx with an empty body.
    #[error("empty archive body from {url}")]
    EmptyBody {
        /// The archive URL.
        url: String,
    },

    /// File system error while preparing or writing the temporary file.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The finished temporary file could not be moved into place.
    #[error("failed to commit archive to {path}: {source}")]
    Commit {
        /// The final artifact path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The download task ended before producing an outcome.
    #[error("download aborted: {reason}")]
    Aborted {
        /// What stopped the task.
        reason: String,
    },

    /// The project path would place the archive outside the projects directory.
    #[error(
        "refusing unsafe project path '{path}'\n  Suggestion: the server returned a path with '..' or an absolute component"
    )]
    UnsafePath {
        /// The offending `path_with_namespace`.
        path: String,
    },
}

impl DownloadError {
    /// Creates a request error.
    pub fn request(source: ApiError) -> Self {
        Self::Request { source }
    }

    /// Creates a body stream error.
    pub fn stream(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Stream {
            url: url.into(),
            source,
        }
    }

    /// Creates an empty body error.
    pub fn empty_body(url: impl Into<String>) -> Self {
        Self::EmptyBody { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a commit error.
    pub fn commit(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Commit {
            path: path.into(),
            source,
        }
    }

    /// Creates an aborted error.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Creates an unsafe path error.
    pub fn unsafe_path(path: impl Into<String>) -> Self {
        Self::UnsafePath { path: path.into() }
    }

    /// Whether another attempt could succeed.
    ///
    /// Remote failures of any kind (including 4xx), broken streams, empty
    /// bodies and write errors on the temporary file are retried. Commit and
    /// path errors and aborted tasks are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request { .. } | Self::Stream { .. } | Self::EmptyBody { .. } | Self::Io { .. } => {
                true
            }
            Self::Commit { .. } | Self::Aborted { .. } | Self::UnsafePath { .. } => false,
        }
    }

    /// HTTP status code, if the failure was an error status.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { source } => source.status(),
            _ => None,
        }
    }
}
