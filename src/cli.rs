//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

use gitlab_backup_core::backup::{DEFAULT_BACKUP_ROOT, DEFAULT_CATALOG_FILE, DEFAULT_REPO_FILE};
use gitlab_backup_core::config::{
    DEFAULT_API_TIMEOUT, DEFAULT_ARCHIVE_TIMEOUT, DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS,
};

const EXIT_STATUS_HELP: &str = "Exit status:\n  \
    0  at least one archive was downloaded or already present, or --list finished\n  \
    1  setup failed, no reference resolved, or every download failed\n\n\
    Individual failed downloads do not change the exit status; they are listed in reports/backup_report.txt.";

/// Back up GitLab repositories as zip archives.
///
/// Reads repository references (IDs, clone URLs, paths or names) from the
/// repo-list file, resolves them against the GitLab API and downloads a
/// repository.zip for each project into a dated backup directory.
#[derive(Parser, Debug)]
#[command(name = "gitlab-backup")]
#[command(author, version, about)]
#[command(after_help = EXIT_STATUS_HELP)]
pub struct Args {
    /// List every project and save HTTP clone URLs to the catalog file (skips backup unless -b/-a)
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Back up the repositories in the repo-list file (default mode)
    #[arg(short = 'b', long)]
    pub backup: bool,

    /// Both list every project and back up the repo-list file
    #[arg(short = 'a', long)]
    pub all: bool,

    /// GitLab instance URL, e.g. https://gitlab.example.com
    #[arg(long, env = "GITLAB_URL")]
    pub url: Option<String>,

    /// Personal access token sent as PRIVATE-TOKEN
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// File with one repository reference per line
    #[arg(long, default_value = DEFAULT_REPO_FILE)]
    pub repo_file: PathBuf,

    /// Where --list writes the project catalog
    #[arg(long, default_value = DEFAULT_CATALOG_FILE)]
    pub catalog_file: PathBuf,

    /// Base directory for dated backups
    #[arg(short = 'o', long, default_value = DEFAULT_BACKUP_ROOT)]
    pub output_dir: PathBuf,

    /// Maximum concurrent archive downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Maximum download attempts per archive (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_ATTEMPTS as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_retries: u8,

    /// Timeout in seconds for lookup and search requests
    #[arg(long, default_value_t = DEFAULT_API_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub api_timeout: u64,

    /// Timeout in seconds for a single archive download attempt
    #[arg(long, default_value_t = DEFAULT_ARCHIVE_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub archive_timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// What the run should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub list: bool,
    pub backup: bool,
}

impl Args {
    /// Combines the mode flags: `--list` alone lists only, `--all` or
    /// `--list --backup` do both, and no flag backs up.
    #[must_use]
    pub fn mode(&self) -> Mode {
        let list = self.list || self.all;
        let backup = self.backup || self.all || !self.list;
        Mode { list, backup }
    }
}

/// Parses process arguments, keeping the matches for value-source checks.
pub fn parse_with_matches() -> (Args, ArgMatches) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    (args, matches)
}
