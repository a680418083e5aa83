//! Error types for project resolution.
//!
//! Messages follow the What/Why/Fix pattern used across the crate so a
//! skipped reference can be diagnosed from the log line alone.

use thiserror::Error;

/// Errors that can occur while resolving a repository reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The reference was empty after trimming.
    #[error("empty repository reference\n  Suggestion: remove blank entries from the repository list")]
    EmptyReference,

    /// A single strategy could not produce a project.
    #[error("{strategy} lookup missed for '{reference}': {reason}")]
    NoMatch {
        /// The reference being resolved.
        reference: String,
        /// Name of the strategy that missed.
        strategy: String,
        /// Why it missed (status code, empty result, underivable path).
        reason: String,
    },

    /// Every strategy in the chain missed.
    #[error(
        "no project found for '{reference}': tried {tried_count} strategy(ies)\n  Suggestion: use the numeric project ID or the exact HTTP clone URL"
    )]
    NotFound {
        /// The reference that could not be resolved.
        reference: String,
        /// Number of strategies that were tried.
        tried_count: usize,
    },

    /// None of the references in a batch resolved.
    #[error(
        "none of the {total} repository reference(s) could be resolved\n  Suggestion: check the hosting URL, the token, and the repository list"
    )]
    NothingResolved {
        /// Number of references in the batch.
        total: usize,
    },
}

impl ResolveError {
    /// Creates a `NoMatch` error for one strategy.
    #[must_use]
    pub fn no_match(reference: &str, strategy: &str, reason: impl Into<String>) -> Self {
        Self::NoMatch {
            reference: reference.to_string(),
            strategy: strategy.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `NotFound` error after the chain is exhausted.
    #[must_use]
    pub fn not_found(reference: &str, tried_count: usize) -> Self {
        Self::NotFound {
            reference: reference.to_string(),
            tried_count,
        }
    }
}
