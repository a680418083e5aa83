//! The repo-list input file and the catalog output file.
//!
//! The repo list holds one reference per line. Blank lines and lines whose
//! first non-blank character is `#` are ignored; everything else is trimmed
//! and passed to the resolver verbatim.

use std::path::Path;

use tracing::{info, warn};

use super::BackupError;
use crate::api::Project;

/// Default repo-list file name.
pub const DEFAULT_REPO_FILE: &str = "repo.txt";

/// Default catalog file name written by `--list`.
pub const DEFAULT_CATALOG_FILE: &str = "all_repos.txt";

/// Written to a missing repo-list file so the user has something to edit.
pub const REPO_FILE_TEMPLATE: &str = "\
# Repositories to back up, one per line.
# Accepted forms:
#   42                                        numeric project ID
#   https://gitlab.example.com/group/app.git  HTTP clone URL
#   git@gitlab.example.com:group/app.git      SSH clone URL
#   group/subgroup/app                        namespaced path
#   app                                       bare project name
# Lines starting with '#' and blank lines are ignored.
";

/// Extracts references from repo-list text, in file order.
#[must_use]
pub fn parse_references(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Reads the repo-list file.
///
/// # Errors
///
/// Returns [`BackupError::Io`] if the file cannot be read and
/// [`BackupError::NoReferences`] if it contains no usable line.
pub async fn read_references(path: &Path) -> Result<Vec<String>, BackupError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BackupError::io(path, e))?;
    let references = parse_references(&text);
    if references.is_empty() {
        return Err(BackupError::NoReferences {
            path: path.to_path_buf(),
        });
    }
    info!(path = %path.display(), count = references.len(), "read repository references");
    Ok(references)
}

/// Writes [`REPO_FILE_TEMPLATE`] to `path` if nothing exists there yet.
///
/// Returns `true` when the template was written.
///
/// # Errors
///
/// Returns [`BackupError::Io`] if the file cannot be created.
pub async fn ensure_repo_file(path: &Path) -> Result<bool, BackupError> {
    if tokio::fs::try_exists(path)
        .await
        .map_err(|e| BackupError::io(path, e))?
    {
        return Ok(false);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BackupError::io(parent, e))?;
    }
    tokio::fs::write(path, REPO_FILE_TEMPLATE)
        .await
        .map_err(|e| BackupError::io(path, e))?;
    warn!(path = %path.display(), "repo list was missing, wrote a template");
    Ok(true)
}

/// Writes one HTTP clone URL per line for every project that has one.
///
/// Returns the number of lines written.
///
/// # Errors
///
/// Returns [`BackupError::Io`] if the file cannot be written.
pub async fn write_catalog(path: &Path, projects: &[Project]) -> Result<usize, BackupError> {
    let lines: Vec<&str> = projects
        .iter()
        .map(|p| p.http_url_to_repo.as_str())
        .filter(|url| !url.is_empty())
        .collect();

    let mut contents = lines.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| BackupError::io(path, e))?;

    info!(path = %path.display(), count = lines.len(), "saved project catalog");
    Ok(lines.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_references_skips_blanks_and_comments() {
        let text = "# header\n\n  42  \n   # indented comment\nhttps://h/g/p.git\n\t\ngroup/app\n";
        assert_eq!(
            parse_references(text),
            vec!["42", "https://h/g/p.git", "group/app"]
        );
    }

    #[test]
    fn test_parse_references_keeps_duplicates() {
        assert_eq!(parse_references("a\na\n"), vec!["a", "a"]);
    }

    #[test]
    fn test_template_has_no_references() {
        assert!(parse_references(REPO_FILE_TEMPLATE).is_empty());
    }

    #[tokio::test]
    async fn test_read_references_only_comments_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repo.txt");
        std::fs::write(&path, "# nothing here\n\n").unwrap();

        let err = read_references(&path).await.unwrap_err();
        assert!(matches!(err, BackupError::NoReferences { .. }));
    }

    #[tokio::test]
    async fn test_read_references_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = read_references(&tmp.path().join("absent.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Io { .. }));
    }

    #[tokio::test]
    async fn test_ensure_repo_file_writes_template_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/repo.txt");

        assert!(ensure_repo_file(&path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), REPO_FILE_TEMPLATE);

        std::fs::write(&path, "42\n").unwrap();
        assert!(!ensure_repo_file(&path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "42\n");
    }

    #[tokio::test]
    async fn test_write_catalog_skips_projects_without_http_url() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("all_repos.txt");
        let projects: Vec<Project> = serde_json::from_value(serde_json::json!([
            {"id": 1, "path_with_namespace": "a/one", "http_url_to_repo": "https://h/a/one.git"},
            {"id": 2, "path_with_namespace": "a/two"},
            {"id": 3, "path_with_namespace": "b/three", "http_url_to_repo": "https://h/b/three.git"},
        ]))
        .unwrap();

        let written = write_catalog(&path, &projects).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "https://h/a/one.git\nhttps://h/b/three.git\n"
        );
    }
}
