//! The four lookup strategies of the default resolution chain.
//!
//! Ordered from cheap and exact to broad and fuzzy:
//! [`IdLookup`] → [`CloneUrlSearch`] → [`PathLookup`] → [`NameSearch`].

use async_trait::async_trait;
use tracing::debug;

use super::path::{extract_project_path, project_name_from_path};
use super::{ResolveError, ResolveStep, ResolveStrategy};
use crate::api::{ApiError, GitLabClient};

fn miss(reference: &str, strategy: &str, error: &ApiError) -> ResolveStep {
    let reason = match error.status() {
        Some(status) => format!("HTTP {status}"),
        None => error.to_string(),
    };
    ResolveStep::Miss(ResolveError::no_match(reference, strategy, reason))
}

/// Looks a project up directly when the reference is a base-10 integer.
#[derive(Debug, Clone)]
pub struct IdLookup {
    client: GitLabClient,
}

impl IdLookup {
    /// Creates the strategy over `client`.
    #[must_use]
    pub fn new(client: GitLabClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResolveStrategy for IdLookup {
    fn name(&self) -> &'static str {
        "id"
    }

    #[tracing::instrument(skip(self), fields(strategy = "id"))]
    async fn attempt(&self, reference: &str) -> ResolveStep {
        let Ok(id) = reference.parse::<u64>() else {
            return ResolveStep::Miss(ResolveError::no_match(
                reference,
                self.name(),
                "not a numeric project ID",
            ));
        };

        match self.client.project_by_id(id).await {
            Ok(project) => ResolveStep::Found(project),
            Err(error) => miss(reference, self.name(), &error),
        }
    }
}

/// Searches with the raw reference and accepts an exact clone-URL match.
#[derive(Debug, Clone)]
pub struct CloneUrlSearch {
    client: GitLabClient,
}

impl CloneUrlSearch {
    /// Creates the strategy over `client`.
    #[must_use]
    pub fn new(client: GitLabClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResolveStrategy for CloneUrlSearch {
    fn name(&self) -> &'static str {
        "clone-url"
    }

    #[tracing::instrument(skip(self), fields(strategy = "clone-url"))]
    async fn attempt(&self, reference: &str) -> ResolveStep {
        let candidates = match self.client.search_projects(reference).await {
            Ok(candidates) => candidates,
            Err(error) => return miss(reference, self.name(), &error),
        };

        debug!(candidates = candidates.len(), "scanning search results");
        match candidates.into_iter().find(|p| p.has_clone_url(reference)) {
            Some(project) => ResolveStep::Found(project),
            None => ResolveStep::Miss(ResolveError::no_match(
                reference,
                self.name(),
                "no search result has this exact clone URL",
            )),
        }
    }
}

/// Derives the namespaced path from the reference and fetches it directly.
#[derive(Debug, Clone)]
pub struct PathLookup {
    client: GitLabClient,
}

impl PathLookup {
    /// Creates the strategy over `client`.
    #[must_use]
    pub fn new(client: GitLabClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResolveStrategy for PathLookup {
    fn name(&self) -> &'static str {
        "path"
    }

    #[tracing::instrument(skip(self), fields(strategy = "path"))]
    async fn attempt(&self, reference: &str) -> ResolveStep {
        let Some(path) = extract_project_path(reference) else {
            return ResolveStep::Miss(ResolveError::no_match(
                reference,
                self.name(),
                "cannot derive a project path",
            ));
        };

        debug!(%path, "derived project path");
        match self.client.project_by_path(&path).await {
            Ok(project) => ResolveStep::Found(project),
            Err(error) => miss(reference, self.name(), &error),
        }
    }
}

/// Last resort: searches by the final path segment and takes the first hit.
///
/// Unlike [`CloneUrlSearch`] there is no exact-match check, so a common name
/// can resolve to an unrelated project. The log line at `info` level names the
/// project actually chosen.
#[derive(Debug, Clone)]
pub struct NameSearch {
    client: GitLabClient,
}

impl NameSearch {
    /// Creates the strategy over `client`.
    #[must_use]
    pub fn new(client: GitLabClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResolveStrategy for NameSearch {
    fn name(&self) -> &'static str {
        "name"
    }

    #[tracing::instrument(skip(self), fields(strategy = "name"))]
    async fn attempt(&self, reference: &str) -> ResolveStep {
        let path = extract_project_path(reference);
        let Some(name) = path.as_deref().and_then(project_name_from_path) else {
            return ResolveStep::Miss(ResolveError::no_match(
                reference,
                self.name(),
                "cannot derive a project name",
            ));
        };

        debug!(%name, "searching by project name");
        match self.client.search_projects(name).await {
            Ok(candidates) => match candidates.into_iter().next() {
                Some(project) => ResolveStep::Found(project),
                None => ResolveStep::Miss(ResolveError::no_match(
                    reference,
                    self.name(),
                    format!("search for '{name}' returned no projects"),
                )),
            },
            Err(error) => miss(reference, self.name(), &error),
        }
    }
}
