//! Backup runs: dated layout, repo-list file, catalog listing and reports.
//!
//! [`Orchestrator::run`] ties the other modules together: it creates the
//! [`BackupLayout`], resolves every reference sequentially, writes the
//! project summary, downloads all archives and writes the final report.

mod error;
mod layout;
mod orchestrator;
mod repo_list;
mod report;

pub use error::BackupError;
pub use layout::{BackupLayout, DEFAULT_BACKUP_ROOT};
pub use orchestrator::{BackupSummary, Orchestrator};
pub use repo_list::{
    DEFAULT_CATALOG_FILE, DEFAULT_REPO_FILE, REPO_FILE_TEMPLATE, ensure_repo_file,
    parse_references, read_references, write_catalog,
};
pub use report::{
    ProjectsSummary, format_duration, render_backup_report, render_projects_txt,
    write_backup_report, write_project_summary,
};
