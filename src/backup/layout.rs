//! Dated directory layout of a backup run.
//!
//! ```text
//! <base>/
//! └── <YYYYMMDD>/
//!     ├── repositories/<path_with_namespace>/repository.zip
//!     └── reports/{projects.json, projects.txt, backup_report.txt}
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use super::BackupError;

/// Default base directory for backups, relative to the working directory.
pub const DEFAULT_BACKUP_ROOT: &str = "gitlab_backups";

/// Directories used by one backup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupLayout {
    date: String,
    backup_dir: PathBuf,
    projects_dir: PathBuf,
    reports_dir: PathBuf,
}

impl BackupLayout {
    /// Layout for a run on `date` under `base_dir`.
    #[must_use]
    pub fn for_date(base_dir: &Path, date: NaiveDate) -> Self {
        let date = date.format("%Y%m%d").to_string();
        let backup_dir = base_dir.join(&date);
        Self {
            projects_dir: backup_dir.join("repositories"),
            reports_dir: backup_dir.join("reports"),
            backup_dir,
            date,
        }
    }

    /// Layout for a run today (local time).
    #[must_use]
    pub fn for_today(base_dir: &Path) -> Self {
        Self::for_date(base_dir, chrono::Local::now().date_naive())
    }

    /// Creates every directory of the layout.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] naming the directory that could not be
    /// created.
    pub async fn create_directories(&self) -> Result<(), BackupError> {
        for dir in [&self.projects_dir, &self.reports_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| BackupError::io(dir, e))?;
            debug!(dir = %dir.display(), "ensured backup directory");
        }
        Ok(())
    }

    /// Run date as `YYYYMMDD`.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Directory of this run.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Directory the archives are written under.
    #[must_use]
    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// Directory the reports are written to.
    #[must_use]
    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }
}
