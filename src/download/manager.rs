//! Concurrent archive downloads with a fixed admission gate.
//!
//! [`DownloadManager::download`] fetches one project's archive: it waits for
//! a slot on the shared semaphore, skips projects whose archive is already
//! on disk, and otherwise streams the archive into a temporary file that is
//! renamed into place only after a complete, non-empty body.
//! [`DownloadManager::download_all`] spawns one task per project and waits
//! for all of them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::StreamExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::artifact::ArtifactPaths;
use super::retry::{RetryDecision, RetryPolicy};
use super::DownloadError;
use crate::api::{GitLabClient, Project};
use crate::config::DownloadConfig;

/// Result of downloading one project's archive.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The archive was fetched and committed.
    Downloaded {
        /// The project's namespaced path.
        project: String,
        /// Committed archive path.
        path: PathBuf,
        /// Archive size in bytes.
        bytes: u64,
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// The archive was already on disk; no request was made.
    AlreadyPresent {
        /// The project's namespaced path.
        project: String,
        /// Existing archive path.
        path: PathBuf,
    },
    /// Every attempt failed, or the failure was permanent.
    Failed {
        /// The project's namespaced path.
        project: String,
        /// Attempts made before giving up.
        attempts: u32,
        /// The last error seen.
        error: DownloadError,
    },
}

impl DownloadOutcome {
    /// The project's namespaced path.
    #[must_use]
    pub fn project(&self) -> &str {
        match self {
            Self::Downloaded { project, .. }
            | Self::AlreadyPresent { project, .. }
            | Self::Failed { project, .. } => project,
        }
    }

    /// Whether the archive is on disk after this outcome.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Statistics from a [`DownloadManager::download_all`] run.
#[derive(Debug, Default)]
pub struct DownloadStats {
    outcomes: Vec<DownloadOutcome>,
    peak_active: usize,
}

impl DownloadStats {
    /// Per-project outcomes in input order.
    #[must_use]
    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    /// Number of archives downloaded in this run.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Downloaded { .. }))
    }

    /// Number of projects skipped because their archive already existed.
    #[must_use]
    pub fn skipped_existing(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::AlreadyPresent { .. }))
    }

    /// Number of projects whose download failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Failed { .. }))
    }

    /// Total number of projects processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of retry attempts made across all projects.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                DownloadOutcome::Downloaded { attempts, .. }
                | DownloadOutcome::Failed { attempts, .. } => attempts.saturating_sub(1) as usize,
                DownloadOutcome::AlreadyPresent { .. } => 0,
            })
            .sum()
    }

    /// Highest number of downloads observed holding a slot at the same time.
    #[must_use]
    pub fn peak_active(&self) -> usize {
        self.peak_active
    }

    /// Whether every processed project failed (false for an empty run).
    #[must_use]
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.failed() == self.total()
    }

    fn count(&self, pred: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

#[derive(Debug, Default)]
struct Activity {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Activity {
    fn enter(self: &Arc<Self>) -> ActiveGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ActiveGuard(Arc::clone(self))
    }

    fn reset_peak(&self) {
        self.peak
            .store(self.active.load(Ordering::SeqCst), Ordering::SeqCst);
    }
}

struct ActiveGuard(Arc<Activity>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Downloads project archives under a fixed concurrency ceiling.
///
/// # Concurrency Model
///
/// - Each project runs in its own Tokio task
/// - A semaphore permit is acquired before any filesystem or network work
/// - Permits are released automatically when the download ends (RAII),
///   including when the task panics
/// - Clones share the same semaphore, so the ceiling holds across clones
#[derive(Debug, Clone)]
pub struct DownloadManager {
    client: GitLabClient,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    policy: RetryPolicy,
    projects_dir: PathBuf,
    activity: Arc<Activity>,
}

impl DownloadManager {
    /// Creates a manager writing archives under `projects_dir`.
    #[instrument(level = "debug", skip(client, config), fields(projects_dir = %projects_dir.display()))]
    pub fn new(client: GitLabClient, config: &DownloadConfig, projects_dir: &Path) -> Self {
        debug!(
            concurrency = config.concurrency(),
            max_attempts = config.max_attempts(),
            "creating download manager"
        );
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(config.concurrency())),
            concurrency: config.concurrency(),
            policy: RetryPolicy::from_config(config),
            projects_dir: projects_dir.to_path_buf(),
            activity: Arc::new(Activity::default()),
        }
    }

    /// Configured concurrency ceiling.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Retry policy applied to each archive.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Directory archives are written under.
    #[must_use]
    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// Downloads every project concurrently and waits for all of them.
    ///
    /// Individual failures never fail the batch; they are reported in the
    /// returned [`DownloadStats`]. A task that panics is logged and counted
    /// as failed.
    #[instrument(skip_all, fields(projects = projects.len(), concurrency = self.concurrency))]
    pub async fn download_all(&self, projects: Vec<Project>) -> DownloadStats {
        info!("starting archive downloads");
        self.activity.reset_peak();

        let mut handles = Vec::with_capacity(projects.len());
        for project in projects {
            let manager = self.clone();
            let name = project.path_with_namespace.clone();
            handles.push((
                name,
                tokio::spawn(async move { manager.download(&project).await }),
            ));
        }

        debug!(task_count = handles.len(), "waiting for downloads to complete");

        let mut outcomes = Vec::with_capacity(handles.len());
        for (project, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(%project, error = %e, "download task panicked");
                    outcomes.push(DownloadOutcome::Failed {
                        project,
                        attempts: 0,
                        error: DownloadError::aborted(e.to_string()),
                    });
                }
            }
        }

        let stats = DownloadStats {
            outcomes,
            peak_active: self.activity.peak.load(Ordering::SeqCst),
        };
        info!(
            completed = stats.completed(),
            skipped_existing = stats.skipped_existing(),
            failed = stats.failed(),
            retried = stats.retried(),
            "archive downloads complete"
        );
        stats
    }

    /// Downloads one project's archive.
    ///
    /// Waits for a free slot first. Never returns an error: failures are
    /// reported as [`DownloadOutcome::Failed`].
    #[instrument(skip_all, fields(project = %project.path_with_namespace, id = project.id))]
    pub async fn download(&self, project: &Project) -> DownloadOutcome {
        let name = project.path_with_namespace.clone();
        let failed = |attempts, error| DownloadOutcome::Failed {
            project: name.clone(),
            attempts,
            error,
        };

        let Ok(_permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
            return failed(0, DownloadError::aborted("download gate closed"));
        };
        let _active = self.activity.enter();

        let paths = match ArtifactPaths::new(&self.projects_dir, &project.path_with_namespace) {
            Ok(paths) => paths,
            Err(error) => {
                warn!(error = %error, "skipping project with unsafe path");
                return failed(0, error);
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(paths.dir()).await {
            let error = DownloadError::io(paths.dir(), e);
            warn!(error = %error, "cannot create project directory");
            return failed(0, error);
        }

        if tokio::fs::try_exists(paths.archive()).await.unwrap_or(false) {
            info!(path = %paths.archive().display(), "archive already present, skipping");
            return DownloadOutcome::AlreadyPresent {
                project: name.clone(),
                path: paths.archive().to_path_buf(),
            };
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(paths.temp())
            .await
        {
            Ok(file) => file,
            Err(e) => {
                let error = DownloadError::io(paths.temp(), e);
                warn!(error = %error, "cannot open temporary file");
                return failed(0, error);
            }
        };

        let (bytes, attempts) = match self.download_with_retry(project, &paths, &mut file).await {
            Ok(done) => done,
            Err((error, attempts)) => {
                drop(file);
                discard_temp(paths.temp()).await;
                warn!(
                    error = %error,
                    status = error.status(),
                    attempts,
                    "download failed after all attempts"
                );
                return failed(attempts, error);
            }
        };

        drop(file);
        if let Err(e) = tokio::fs::rename(paths.temp(), paths.archive()).await {
            discard_temp(paths.temp()).await;
            let error = DownloadError::commit(paths.archive(), e);
            warn!(error = %error, "cannot commit archive");
            return failed(attempts, error);
        }

        info!(path = %paths.archive().display(), bytes, attempts, "download completed");
        DownloadOutcome::Downloaded {
            project: name.clone(),
            path: paths.archive().to_path_buf(),
            bytes,
            attempts,
        }
    }

    /// Runs attempts until one succeeds or the policy gives up.
    ///
    /// Returns the byte count and attempts used, or the last error and the
    /// attempts made.
    async fn download_with_retry(
        &self,
        project: &Project,
        paths: &ArtifactPaths,
        file: &mut File,
    ) -> Result<(u64, u32), (DownloadError, u32)> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "attempting download");

            match self.attempt_once(project, paths.temp(), file).await {
                Ok(bytes) => return Ok((bytes, attempt)),
                Err(e) => match self.policy.should_retry(e.is_transient(), attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next_attempt,
                    } => {
                        warn!(
                            attempt = next_attempt,
                            max_attempts = self.policy.max_attempts(),
                            delay_ms = delay.as_millis(),
                            status = e.status(),
                            error = %e,
                            "retrying download"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        debug!(%reason, "not retrying download");
                        return Err((e, attempt));
                    }
                },
            }
        }
    }

    async fn attempt_once(
        &self,
        project: &Project,
        temp: &Path,
        file: &mut File,
    ) -> Result<u64, DownloadError> {
        file.set_len(0)
            .await
            .map_err(|e| DownloadError::io(temp, e))?;
        file.seek(std::io::SeekFrom::Start(0))
            .await
            .map_err(|e| DownloadError::io(temp, e))?;

        let url = self.client.archive_url(project.id);
        let response = self
            .client
            .request_archive(project.id)
            .await
            .map_err(DownloadError::request)?;

        let bytes = stream_to_file(file, response, &url, temp).await?;
        if bytes == 0 {
            return Err(DownloadError::empty_body(url));
        }

        file.sync_all()
            .await
            .map_err(|e| DownloadError::io(temp, e))?;
        Ok(bytes)
    }
}

/// Streams the response body into `file`, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::stream(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    Ok(bytes_written)
}

async fn discard_temp(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "failed to remove temporary file");
    }
}
