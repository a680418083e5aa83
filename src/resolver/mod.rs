//! Project resolution: turning raw repository references into [`Project`]s.
//!
//! A reference may be a numeric ID, a clone URL, a partial or decorated path,
//! or a bare name. [`ProjectResolver`] runs an ordered list of
//! [`ResolveStrategy`] objects and stops at the first one that finds a project.
//!
//! # Architecture
//!
//! - [`ResolveStrategy`] - Async trait each lookup strategy implements
//! - [`ProjectResolver`] - Ordered chain with early exit and batch resolution
//! - [`IdLookup`], [`CloneUrlSearch`], [`PathLookup`], [`NameSearch`] - The
//!   default chain, in order
//!
//! # Example
//!
//! ```no_run
//! use gitlab_backup_core::{ApiConfig, GitLabClient, ProjectResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitLabClient::new(ApiConfig::new("https://gitlab.example.com", "token")?)?;
//! let resolver = ProjectResolver::with_default_chain(&client);
//! let project = resolver.resolve("https://gitlab.example.com/team/app.git").await?;
//! println!("resolved {} (ID {})", project.path_with_namespace, project.id);
//! # Ok(())
//! # }
//! ```

mod chain;
mod error;
mod path;
mod strategies;

pub use chain::{ProjectResolver, ResolutionReport, ResolvedReference, SkippedReference};
pub use error::ResolveError;
pub use path::{extract_project_path, project_name_from_path};
pub use strategies::{CloneUrlSearch, IdLookup, NameSearch, PathLookup};

use async_trait::async_trait;

use crate::api::Project;

/// Outcome of a single strategy attempt.
#[derive(Debug, Clone)]
pub enum ResolveStep {
    /// The strategy found the project.
    Found(Project),
    /// The strategy could not find it; the chain moves on.
    Miss(ResolveError),
}

/// A single way of looking a reference up.
///
/// Strategies never fail hard: transport errors, error statuses and
/// undecodable bodies all surface as [`ResolveStep::Miss`] so the chain can
/// fall through to the next strategy.
///
/// # Object Safety
///
/// Uses `async_trait` so strategies can be stored as `Box<dyn ResolveStrategy>`.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    /// Short name used in logs and reports (e.g. `"id"`, `"path"`).
    fn name(&self) -> &'static str;

    /// Tries to resolve a trimmed, non-empty reference.
    async fn attempt(&self, reference: &str) -> ResolveStep;
}
