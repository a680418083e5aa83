//! On-disk locations of a project archive.

use std::path::{Component, Path, PathBuf};

use super::DownloadError;

/// File name of a committed archive inside its project directory.
pub const ARCHIVE_FILE_NAME: &str = "repository.zip";

/// File name of the in-progress download next to the archive.
pub const TEMP_FILE_NAME: &str = "repository.zip.tmp";

/// Final and temporary paths for one project's archive.
///
/// The final path is `<root>/<path_with_namespace>/repository.zip`. A file
/// there is always a complete, non-empty download: bytes are written to the
/// temporary sibling and renamed into place only once the body is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    dir: PathBuf,
    archive: PathBuf,
    temp: PathBuf,
}

impl ArtifactPaths {
    /// Computes the paths for `path_with_namespace` under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::UnsafePath`] if the namespaced path is empty,
    /// absolute, or contains `.`/`..` components.
    pub fn new(root: &Path, path_with_namespace: &str) -> Result<Self, DownloadError> {
        let relative = Path::new(path_with_namespace);
        let safe = !path_with_namespace.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(DownloadError::unsafe_path(path_with_namespace));
        }

        let dir = root.join(relative);
        Ok(Self {
            archive: dir.join(ARCHIVE_FILE_NAME),
            temp: dir.join(TEMP_FILE_NAME),
            dir,
        })
    }

    /// Directory holding the archive.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Committed archive path.
    #[must_use]
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// In-progress download path.
    #[must_use]
    pub fn temp(&self) -> &Path {
        &self.temp
    }
}
