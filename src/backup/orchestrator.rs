//! End-to-end backup run: resolve, summarize, download, report.

use chrono::{DateTime, Local};
use tracing::{info, instrument, warn};

use super::report::{write_backup_report, write_project_summary};
use super::{BackupError, BackupLayout};
use crate::api::GitLabClient;
use crate::config::DownloadConfig;
use crate::download::{DownloadManager, DownloadStats};
use crate::resolver::{ProjectResolver, ResolutionReport};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct BackupSummary {
    /// Resolved and skipped references.
    pub resolution: ResolutionReport,
    /// Per-project download outcomes.
    pub downloads: DownloadStats,
    /// When the run started.
    pub started: DateTime<Local>,
    /// When the last download finished.
    pub finished: DateTime<Local>,
}

impl BackupSummary {
    /// True unless every download failed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.downloads.all_failed()
    }
}

/// Drives one backup run over a fixed layout.
#[derive(Debug)]
pub struct Orchestrator {
    resolver: ProjectResolver,
    downloads: DownloadManager,
    layout: BackupLayout,
}

impl Orchestrator {
    /// Creates an orchestrator using the default resolution chain.
    #[must_use]
    pub fn new(client: GitLabClient, config: &DownloadConfig, layout: BackupLayout) -> Self {
        let resolver = ProjectResolver::with_default_chain(&client);
        Self::with_resolver(resolver, client, config, layout)
    }

    /// Creates an orchestrator with a custom resolver.
    #[must_use]
    pub fn with_resolver(
        resolver: ProjectResolver,
        client: GitLabClient,
        config: &DownloadConfig,
        layout: BackupLayout,
    ) -> Self {
        let downloads = DownloadManager::new(client, config, layout.projects_dir());
        Self {
            resolver,
            downloads,
            layout,
        }
    }

    /// The layout this run writes into.
    #[must_use]
    pub fn layout(&self) -> &BackupLayout {
        &self.layout
    }

    /// Runs the backup for `references`.
    ///
    /// References naming the same project are downloaded once. Report-writing
    /// failures are logged and do not abort the run.
    ///
    /// # Errors
    ///
    /// Fails if the backup directories cannot be created or if no reference
    /// resolves. Per-project download failures are reported in the summary.
    #[instrument(skip_all, fields(date = %self.layout.date(), references = references.len()))]
    pub async fn run<S: AsRef<str>>(&self, references: &[S]) -> Result<BackupSummary, BackupError> {
        let started = Local::now();
        self.layout.create_directories().await?;
        info!(
            dir = %self.layout.backup_dir().display(),
            concurrency = self.downloads.concurrency(),
            max_attempts = self.downloads.retry_policy().max_attempts(),
            "starting backup"
        );

        let resolution = self.resolver.resolve_all(references).await?;
        for duplicate in resolution.duplicates() {
            info!(
                reference = %duplicate.reference,
                project = %duplicate.project.path_with_namespace,
                "reference names an already queued project, skipping"
            );
        }
        let projects = resolution.unique_projects();
        info!(projects = projects.len(), "resolved projects");

        if let Err(e) = write_project_summary(&self.layout, Local::now(), &projects).await {
            warn!(error = %e, "failed to write project summary");
        }

        let downloads = self.downloads.download_all(projects).await;
        let finished = Local::now();

        if let Err(e) = write_backup_report(&self.layout, started, finished, &downloads).await {
            warn!(error = %e, "failed to write backup report");
        }

        info!(
            elapsed_secs = (finished - started).num_seconds(),
            completed = downloads.completed(),
            failed = downloads.failed(),
            "backup finished"
        );
        Ok(BackupSummary {
            resolution,
            downloads,
            started,
            finished,
        })
    }
}
