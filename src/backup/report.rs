//! Report files written into `reports/`.
//!
//! | File | Written | Contents |
//! |------|---------|----------|
//! | `projects.json` | after resolution | `{ backup_time, total_projects, projects }` |
//! | `projects.txt` | after resolution | human-readable project list |
//! | `backup_report.txt` | after downloads | timing, totals, per-outcome counts, failures |

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use super::{BackupError, BackupLayout};
use crate::api::Project;
use crate::download::{DownloadOutcome, DownloadStats};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RULE_WIDTH: usize = 50;

/// Body of `projects.json`.
#[derive(Debug, Serialize)]
pub struct ProjectsSummary<'a> {
    /// When the summary was written.
    pub backup_time: String,
    /// Number of resolved projects.
    pub total_projects: usize,
    /// The resolved projects, in input order.
    pub projects: &'a [Project],
}

/// Writes `projects.json` and `projects.txt`.
///
/// # Errors
///
/// Returns [`BackupError`] if either file cannot be written.
pub async fn write_project_summary(
    layout: &BackupLayout,
    written_at: DateTime<Local>,
    projects: &[Project],
) -> Result<(), BackupError> {
    let summary = ProjectsSummary {
        backup_time: written_at.format(TIMESTAMP_FORMAT).to_string(),
        total_projects: projects.len(),
        projects,
    };

    let json_path = layout.reports_dir().join("projects.json");
    let json = serde_json::to_string_pretty(&summary).map_err(|source| BackupError::Serialize {
        path: json_path.clone(),
        source,
    })?;
    write_file(&json_path, json).await?;

    let txt_path = layout.reports_dir().join("projects.txt");
    write_file(&txt_path, render_projects_txt(layout.date(), &summary)).await?;

    info!(dir = %layout.reports_dir().display(), projects = projects.len(), "wrote project summary");
    Ok(())
}

/// Writes `backup_report.txt`.
///
/// # Errors
///
/// Returns [`BackupError::Io`] if the file cannot be written.
pub async fn write_backup_report(
    layout: &BackupLayout,
    started: DateTime<Local>,
    finished: DateTime<Local>,
    stats: &DownloadStats,
) -> Result<(), BackupError> {
    let path = layout.reports_dir().join("backup_report.txt");
    write_file(&path, render_backup_report(layout, started, finished, stats)).await?;
    info!(path = %path.display(), "wrote backup report");
    Ok(())
}

/// Renders `projects.txt`.
#[must_use]
pub fn render_projects_txt(date: &str, summary: &ProjectsSummary<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Backup date: {date}");
    let _ = writeln!(out, "Backup time: {}", summary.backup_time);
    let _ = writeln!(out, "Total projects: {}", summary.total_projects);
    let _ = writeln!(out, "{}\n", "=".repeat(RULE_WIDTH));

    for p in summary.projects {
        let _ = writeln!(out, "Name: {}", p.name);
        let _ = writeln!(out, "Path: {}", p.path_with_namespace);
        let _ = writeln!(out, "ID: {}", p.id);
        let _ = writeln!(out, "Web URL: {}", p.web_url);
        let _ = writeln!(out, "SSH URL: {}", p.ssh_url_to_repo);
        let _ = writeln!(out, "HTTP URL: {}", p.http_url_to_repo);
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    }
    out
}

/// Renders `backup_report.txt`.
#[must_use]
pub fn render_backup_report(
    layout: &BackupLayout,
    started: DateTime<Local>,
    finished: DateTime<Local>,
    stats: &DownloadStats,
) -> String {
    let elapsed = (finished - started).to_std().unwrap_or_default();
    let rule = "=".repeat(RULE_WIDTH);

    let mut out = String::new();
    let _ = writeln!(out, "GitLab backup report");
    let _ = writeln!(out, "{rule}\n");
    let _ = writeln!(out, "Backup date: {}", layout.date());
    let _ = writeln!(out, "Started: {}", started.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "Finished: {}", finished.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "Duration: {}", format_duration(elapsed));
    let _ = writeln!(out, "Total projects: {}", stats.total());
    let _ = writeln!(out, "Downloaded: {}", stats.completed());
    let _ = writeln!(out, "Already present: {}", stats.skipped_existing());
    let _ = writeln!(out, "Failed: {}", stats.failed());
    let _ = writeln!(out, "Retries: {}", stats.retried());
    let _ = writeln!(out, "Backup directory: {}", layout.backup_dir().display());
    let _ = writeln!(out, "{rule}");

    let failures: Vec<_> = stats
        .outcomes()
        .iter()
        .filter_map(|o| match o {
            DownloadOutcome::Failed {
                project,
                attempts,
                error,
            } => Some((project, attempts, error)),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\nFailed projects:");
        for (project, attempts, error) in failures {
            let _ = writeln!(out, "  {project} ({attempts} attempt(s)): {error}");
        }
    }
    out
}

/// Formats a duration rounded to whole seconds, e.g. `1h2m3s`, `45s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs() + u64::from(duration.subsec_millis() >= 500);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m{seconds}s"),
        _ => format!("{hours}h{minutes}m{seconds}s"),
    }
}

async fn write_file(path: &Path, contents: String) -> Result<(), BackupError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| BackupError::io(path, e))
}
