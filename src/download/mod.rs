//! Concurrent, retried, crash-safe archive downloads.
//!
//! # Features
//!
//! - Fixed concurrency ceiling via a shared semaphore (default 5)
//! - Bounded retries with linear backoff (default 3 attempts, 1s then 2s)
//! - Streaming to a temporary file, committed by rename only when complete
//! - Idempotent reruns: projects whose archive exists are skipped
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use gitlab_backup_core::{ApiConfig, DownloadConfig, DownloadManager, GitLabClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitLabClient::new(ApiConfig::new("https://gitlab.example.com", "token")?)?;
//! let project = client.project_by_id(42).await?;
//! let manager = DownloadManager::new(client, &DownloadConfig::default(), Path::new("./repos"));
//! let stats = manager.download_all(vec![project]).await;
//! println!("completed: {}, failed: {}", stats.completed(), stats.failed());
//! # Ok(())
//! # }
//! ```

mod artifact;
mod error;
mod manager;
mod retry;

pub use artifact::{ARCHIVE_FILE_NAME, ArtifactPaths, TEMP_FILE_NAME};
pub use error::DownloadError;
pub use manager::{DownloadManager, DownloadOutcome, DownloadStats};
pub use retry::{RetryDecision, RetryPolicy};
