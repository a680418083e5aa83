//! CLI entry point for the gitlab-backup tool.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use gitlab_backup_core::backup::{
    BackupError, BackupLayout, ensure_repo_file, read_references, write_catalog,
};
use gitlab_backup_core::config::DEFAULT_BACKOFF_BASE;
use gitlab_backup_core::{ApiConfig, DownloadConfig, GitLabClient, Orchestrator};
use tracing::{debug, error, info, warn};

mod app_config;
mod cli;

use app_config::{CliValueSources, apply_config_defaults, load_default_file_config};
use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let (args, matches) = cli::parse_with_matches();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let file_config = load_default_file_config()?;
    if let Some((path, _)) = &file_config {
        debug!(path = %path.display(), "loaded config file");
    }
    let sources = CliValueSources::from_matches(&matches);
    let args = apply_config_defaults(args, &sources, file_config.as_ref().map(|(_, c)| c));

    let url = args.url.as_deref().context(
        "No GitLab URL configured. Pass --url, set GITLAB_URL, or add `url = \"...\"` to the config file",
    )?;
    let token = args
        .token
        .clone()
        .context("No access token configured. Pass --token or set GITLAB_TOKEN")?;

    let api_config = ApiConfig::new(url, token)?
        .with_api_timeout(Duration::from_secs(args.api_timeout))
        .with_archive_timeout(Duration::from_secs(args.archive_timeout));
    let client = GitLabClient::new(api_config)?;

    let mode = args.mode();
    info!(url = %client.config().base_url(), list = mode.list, backup = mode.backup, "gitlab-backup starting");

    if mode.list {
        run_list(&client, &args).await?;
    }

    if mode.backup {
        return run_backup(client, &args).await;
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_list(client: &GitLabClient, args: &Args) -> Result<()> {
    info!("listing all projects");
    let projects = client
        .list_all_projects()
        .await
        .map_err(BackupError::catalog)?;
    let written = write_catalog(&args.catalog_file, &projects)
        .await
        .context("Failed to save project catalog")?;
    info!(
        path = %args.catalog_file.display(),
        projects = projects.len(),
        written,
        "catalog saved"
    );
    Ok(())
}

async fn run_backup(client: GitLabClient, args: &Args) -> Result<ExitCode> {
    if ensure_repo_file(&args.repo_file).await? {
        warn!(
            path = %args.repo_file.display(),
            "created a template repo list; add repository references to it and run again"
        );
    }
    let references = read_references(&args.repo_file).await?;

    let download_config = DownloadConfig::new(
        usize::from(args.concurrency),
        u32::from(args.max_retries),
        DEFAULT_BACKOFF_BASE,
    )?;
    let layout = BackupLayout::for_today(&args.output_dir);
    let orchestrator = Orchestrator::new(client, &download_config, layout);

    let summary = orchestrator
        .run(&references)
        .await
        .context("Backup run failed")?;

    let stats = &summary.downloads;
    info!(
        resolved = summary.resolution.resolved.len(),
        skipped = summary.resolution.skipped.len(),
        completed = stats.completed(),
        already_present = stats.skipped_existing(),
        failed = stats.failed(),
        retried = stats.retried(),
        dir = %orchestrator.layout().backup_dir().display(),
        "Backup complete"
    );

    if summary.succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(failed = stats.failed(), "every download failed");
        Ok(ExitCode::FAILURE)
    }
}
