//! Ordered strategy chain with early exit.
//!
//! The [`ProjectResolver`] owns the strategies and runs them in registration
//! order for each reference, returning the first project found.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::strategies::{CloneUrlSearch, IdLookup, NameSearch, PathLookup};
use super::{ResolveError, ResolveStep, ResolveStrategy};
use crate::api::{GitLabClient, Project};

/// A reference that resolved, with the strategy that found it.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedReference {
    /// The reference text as given.
    pub reference: String,
    /// Name of the winning strategy.
    pub strategy: &'static str,
    /// The resolved project.
    pub project: Project,
}

/// A reference that was skipped, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedReference {
    /// The reference text as given.
    pub reference: String,
    /// Human-readable reason, including the last strategy's miss.
    pub reason: String,
}

/// Result of resolving a batch of references.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    /// References that resolved, in input order.
    pub resolved: Vec<ResolvedReference>,
    /// References that were skipped, in input order.
    pub skipped: Vec<SkippedReference>,
}

impl ResolutionReport {
    /// Resolved projects in input order.
    #[must_use]
    pub fn projects(&self) -> Vec<Project> {
        self.resolved.iter().map(|r| r.project.clone()).collect()
    }

    /// Resolved projects in first-seen order, one per project ID.
    ///
    /// Two references naming the same project (`42` and its clone URL, or a
    /// repeated line) collapse into the first one.
    #[must_use]
    pub fn unique_projects(&self) -> Vec<Project> {
        let mut seen = HashSet::new();
        self.resolved
            .iter()
            .filter(|r| seen.insert(r.project.id))
            .map(|r| r.project.clone())
            .collect()
    }

    /// Resolved references whose project an earlier reference already named.
    #[must_use]
    pub fn duplicates(&self) -> Vec<&ResolvedReference> {
        let mut seen = HashSet::new();
        self.resolved
            .iter()
            .filter(|r| !seen.insert(r.project.id))
            .collect()
    }
}

/// An ordered chain of [`ResolveStrategy`] objects.
pub struct ProjectResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl ProjectResolver {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Builds the default chain: ID, clone URL, path, then name.
    #[must_use]
    pub fn with_default_chain(client: &GitLabClient) -> Self {
        let mut resolver = Self::new();
        resolver.register(Box::new(IdLookup::new(client.clone())));
        resolver.register(Box::new(CloneUrlSearch::new(client.clone())));
        resolver.register(Box::new(PathLookup::new(client.clone())));
        resolver.register(Box::new(NameSearch::new(client.clone())));
        resolver
    }

    /// Appends a strategy to the end of the chain.
    #[tracing::instrument(skip(self, strategy), fields(strategy_name))]
    pub fn register(&mut self, strategy: Box<dyn ResolveStrategy>) {
        tracing::Span::current().record("strategy_name", strategy.name());
        debug!(name = strategy.name(), "registering strategy");
        self.strategies.push(strategy);
    }

    /// Names of the registered strategies, in evaluation order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Returns true if no strategies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Resolves one reference to a project.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::EmptyReference`] for blank input and
    /// [`ResolveError::NotFound`] when every strategy missed.
    pub async fn resolve(&self, reference: &str) -> Result<Project, ResolveError> {
        self.resolve_reference(reference)
            .await
            .map(|resolved| resolved.project)
    }

    /// Resolves one reference and reports which strategy found it.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    #[tracing::instrument(skip(self))]
    pub async fn resolve_reference(
        &self,
        reference: &str,
    ) -> Result<ResolvedReference, ResolveError> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::EmptyReference);
        }

        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "trying strategy");
            match strategy.attempt(trimmed).await {
                ResolveStep::Found(project) => {
                    info!(
                        strategy = strategy.name(),
                        project = %project.path_with_namespace,
                        id = project.id,
                        "resolved reference"
                    );
                    return Ok(ResolvedReference {
                        reference: reference.to_string(),
                        strategy: strategy.name(),
                        project,
                    });
                }
                ResolveStep::Miss(err) => {
                    debug!(strategy = strategy.name(), error = %err, "strategy missed");
                }
            }
        }

        Err(ResolveError::not_found(trimmed, self.strategies.len()))
    }

    /// Resolves references one at a time, skipping the ones that fail.
    ///
    /// Duplicates are resolved independently. Each skip is logged at `warn`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NothingResolved`] when no reference resolved,
    /// including when `references` is empty.
    #[tracing::instrument(skip_all, fields(total = references.len()))]
    pub async fn resolve_all<S: AsRef<str>>(
        &self,
        references: &[S],
    ) -> Result<ResolutionReport, ResolveError> {
        let mut report = ResolutionReport::default();

        for reference in references {
            let reference = reference.as_ref();
            match self.resolve_reference(reference).await {
                Ok(resolved) => report.resolved.push(resolved),
                Err(err) => {
                    warn!(%reference, error = %err, "skipping unresolved reference");
                    report.skipped.push(SkippedReference {
                        reference: reference.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            resolved = report.resolved.len(),
            skipped = report.skipped.len(),
            "resolution complete"
        );

        if report.resolved.is_empty() {
            return Err(ResolveError::NothingResolved {
                total: references.len(),
            });
        }
        Ok(report)
    }
}

impl std::fmt::Debug for ProjectResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectResolver")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

impl Default for ProjectResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    // ==================== MockStrategy for Testing ====================

    struct MockStrategy {
        mock_name: &'static str,
        project: Option<Project>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ResolveStrategy for MockStrategy {
        fn name(&self) -> &'static str {
            self.mock_name
        }

        async fn attempt(&self, reference: &str) -> ResolveStep {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.project {
                Some(project) => ResolveStep::Found(project.clone()),
                None => ResolveStep::Miss(ResolveError::no_match(
                    reference,
                    self.mock_name,
                    "mock miss",
                )),
            }
        }
    }

    fn project(id: u64, path: &str) -> Project {
        serde_json::from_value(serde_json::json!({"id": id, "path_with_namespace": path}))
            .unwrap()
    }

    fn mock(name: &'static str, project: Option<Project>) -> (MockStrategy, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            MockStrategy {
                mock_name: name,
                project,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }

    #[test]
    fn test_resolver_new_is_empty() {
        let resolver = ProjectResolver::new();
        assert!(resolver.is_empty());
        assert!(resolver.strategy_names().is_empty());
    }

    #[test]
    fn test_resolver_debug_lists_strategies() {
        let mut resolver = ProjectResolver::new();
        let (first, _) = mock("first", None);
        resolver.register(Box::new(first));
        assert!(format!("{resolver:?}").contains("first"));
    }

    #[tokio::test]
    async fn test_resolve_stops_at_first_success() {
        let mut resolver = ProjectResolver::new();
        let (miss, miss_calls) = mock("miss", None);
        let (hit, hit_calls) = mock("hit", Some(project(1, "a/b")));
        let (later, later_calls) = mock("later", Some(project(2, "c/d")));
        resolver.register(Box::new(miss));
        resolver.register(Box::new(hit));
        resolver.register(Box::new(later));

        let resolved = resolver.resolve_reference("anything").await.unwrap();
        assert_eq!(resolved.strategy, "hit");
        assert_eq!(resolved.project.id, 1);
        assert_eq!(miss_calls.load(Ordering::SeqCst), 1);
        assert_eq!(hit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_all_miss_is_not_found() {
        let mut resolver = ProjectResolver::new();
        let (a, _) = mock("a", None);
        let (b, _) = mock("b", None);
        resolver.register(Box::new(a));
        resolver.register(Box::new(b));

        let err = resolver.resolve("grp/proj").await.unwrap_err();
        assert_eq!(err, ResolveError::not_found("grp/proj", 2));
    }

    #[tokio::test]
    async fn test_resolve_blank_reference_is_rejected_without_attempts() {
        let mut resolver = ProjectResolver::new();
        let (a, calls) = mock("a", Some(project(1, "a/b")));
        resolver.register(Box::new(a));

        let err = resolver.resolve("   ").await.unwrap_err();
        assert_eq!(err, ResolveError::EmptyReference);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_all_skips_failures_and_keeps_order() {
        struct ByReference;

        #[async_trait]
        impl ResolveStrategy for ByReference {
            fn name(&self) -> &'static str {
                "by-reference"
            }

            async fn attempt(&self, reference: &str) -> ResolveStep {
                match reference.parse::<u64>() {
                    Ok(id) => ResolveStep::Found(project(id, &format!("g/p{id}"))),
                    Err(_) => ResolveStep::Miss(ResolveError::no_match(
                        reference,
                        "by-reference",
                        "not numeric",
                    )),
                }
            }
        }

        let mut resolver = ProjectResolver::new();
        resolver.register(Box::new(ByReference));

        let report = resolver
            .resolve_all(&["3", "bogus", "1", "3"])
            .await
            .unwrap();
        let ids: Vec<u64> = report.projects().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 3], "duplicates resolve independently");
        let unique: Vec<u64> = report.unique_projects().iter().map(|p| p.id).collect();
        assert_eq!(unique, vec![3, 1]);
        let dups: Vec<&str> = report
            .duplicates()
            .iter()
            .map(|r| r.reference.as_str())
            .collect();
        assert_eq!(dups, vec!["3"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reference, "bogus");
    }

    #[tokio::test]
    async fn test_resolve_all_nothing_resolved_is_error() {
        let mut resolver = ProjectResolver::new();
        let (a, _) = mock("a", None);
        resolver.register(Box::new(a));

        let err = resolver.resolve_all(&["x", "y"]).await.unwrap_err();
        assert_eq!(err, ResolveError::NothingResolved { total: 2 });

        let empty: [&str; 0] = [];
        let err = resolver.resolve_all(&empty).await.unwrap_err();
        assert_eq!(err, ResolveError::NothingResolved { total: 0 });
    }
}
