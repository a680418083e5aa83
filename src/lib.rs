//! GitLab Backup Core Library
//!
//! Resolves loosely written repository references (numeric IDs, clone URLs,
//! partial paths, bare names) against a GitLab-style `/api/v4` and downloads
//! a `repository.zip` archive for each resolved project.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`api`] - Authenticated API client and the `Project` record
//! - [`resolver`] - Ordered fallback chain turning references into projects
//! - [`download`] - Concurrent, retried, atomically committed archive downloads
//! - [`backup`] - Dated backup layout, repo-list file, catalog and reports
//! - [`config`] - Run-scoped settings for the client and the downloader

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod backup;
pub mod config;
pub mod download;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiError, GitLabClient, Project};
pub use backup::{BackupError, BackupLayout, BackupSummary, Orchestrator};
pub use config::{ApiConfig, ConfigError, DownloadConfig};
pub use download::{DownloadError, DownloadManager, DownloadOutcome, DownloadStats, RetryPolicy};
pub use resolver::{ProjectResolver, ResolutionReport, ResolveError, ResolveStrategy};
