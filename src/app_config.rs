//! Optional file configuration for CLI defaults.
//!
//! The file uses a small `key = value` subset of TOML: strings are double
//! quoted, integers are bare, `#` starts a comment outside strings.
//!
//! ```toml
//! url = "https://gitlab.example.com"
//! output_dir = "/srv/backups/gitlab"
//! concurrency = 8
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::cli::Args;

/// Values read from the config file; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Instance root URL.
    pub url: Option<String>,
    /// Base directory for dated backups.
    pub output_dir: Option<PathBuf>,
    /// Repo-list file.
    pub repo_file: Option<PathBuf>,
    /// Concurrent archive downloads (1..=100).
    pub concurrency: Option<u8>,
    /// Attempts per archive (1..=10).
    pub max_retries: Option<u8>,
    /// Metadata request timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Archive request timeout in seconds.
    pub archive_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates values against the same ranges the CLI enforces.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=100).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=100");
        }
        if let Some(max_retries) = self.max_retries
            && !(1..=10).contains(&max_retries)
        {
            bail!("Invalid config value for `max_retries`: {max_retries}. Expected range: 1..=10");
        }
        validate_timeout_secs("api_timeout_secs", self.api_timeout_secs, 3600)?;
        validate_timeout_secs("archive_timeout_secs", self.archive_timeout_secs, 86_400)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..={max}");
    }
    Ok(())
}

/// Which arguments were given explicitly (command line or environment).
#[derive(Debug, Clone, Copy, Default)]
pub struct CliValueSources {
    pub url: bool,
    pub output_dir: bool,
    pub repo_file: bool,
    pub concurrency: bool,
    pub max_retries: bool,
    pub api_timeout: bool,
    pub archive_timeout: bool,
}

impl CliValueSources {
    /// Reads value sources from parsed matches.
    #[must_use]
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            url: is_explicit(matches, "url"),
            output_dir: is_explicit(matches, "output_dir"),
            repo_file: is_explicit(matches, "repo_file"),
            concurrency: is_explicit(matches, "concurrency"),
            max_retries: is_explicit(matches, "max_retries"),
            api_timeout: is_explicit(matches, "api_timeout"),
            archive_timeout: is_explicit(matches, "archive_timeout"),
        }
    }
}

fn is_explicit(matches: &ArgMatches, id: &str) -> bool {
    matches!(
        matches.value_source(id),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

/// Fills arguments that were left at their defaults from the file config.
#[must_use]
pub fn apply_config_defaults(
    mut args: Args,
    sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Args {
    let Some(file) = file_config else {
        return args;
    };

    if !sources.url
        && let Some(url) = &file.url
    {
        args.url = Some(url.clone());
    }
    if !sources.output_dir
        && let Some(output_dir) = &file.output_dir
    {
        args.output_dir.clone_from(output_dir);
    }
    if !sources.repo_file
        && let Some(repo_file) = &file.repo_file
    {
        args.repo_file.clone_from(repo_file);
    }
    if !sources.concurrency
        && let Some(concurrency) = file.concurrency
    {
        args.concurrency = concurrency;
    }
    if !sources.max_retries
        && let Some(max_retries) = file.max_retries
    {
        args.max_retries = max_retries;
    }
    if !sources.api_timeout
        && let Some(secs) = file.api_timeout_secs
    {
        args.api_timeout = secs;
    }
    if !sources.archive_timeout
        && let Some(secs) = file.archive_timeout_secs
    {
        args.archive_timeout = secs;
    }
    args
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/gitlab-backup/config.toml`
/// 2. `$HOME/.config/gitlab-backup/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("gitlab-backup")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("gitlab-backup")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file from the default path, if one exists.
pub fn load_default_file_config() -> Result<Option<(PathBuf, FileConfig)>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let config = load_file_config(&path)?;
    Ok(Some((path, config)))
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {}", line_index + 1);

        match key {
            "url" => cfg.url = Some(parse_string_literal(value).with_context(context)?),
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(context)?,
                ));
            }
            "repo_file" => {
                cfg.repo_file = Some(PathBuf::from(
                    parse_string_literal(value).with_context(context)?,
                ));
            }
            "concurrency" => cfg.concurrency = Some(parse_integer_u8(value).with_context(context)?),
            "max_retries" => cfg.max_retries = Some(parse_integer_u8(value).with_context(context)?),
            "api_timeout_secs" => {
                cfg.api_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "archive_timeout_secs" => {
                cfg.archive_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
