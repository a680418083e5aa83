//! Client for the GitLab v4 REST API.
//!
//! Every request carries the configured `PRIVATE-TOKEN` header. Non-2xx
//! responses have no structured error contract; only the status code is kept.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | [`GitLabClient::project_by_id`] | `GET /projects/{id}` |
//! | [`GitLabClient::project_by_path`] | `GET /projects/{url-encoded-path}` |
//! | [`GitLabClient::search_projects`] | `GET /projects?search={text}` |
//! | [`GitLabClient::list_projects_page`] | `GET /projects?page=&per_page=&order_by=id&sort=asc` |
//! | [`GitLabClient::request_archive`] | `GET /projects/{id}/repository/archive.zip` |
//!
//! # Example
//!
//! ```no_run
//! use gitlab_backup_core::{ApiConfig, GitLabClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiConfig::new("https://gitlab.example.com", "glpat-token")?;
//! let client = GitLabClient::new(config)?;
//! let project = client.project_by_path("team/app").await?;
//! println!("{} -> {}", project.path_with_namespace, project.id);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod project;

pub use client::{CATALOG_PAGE_SIZE, GitLabClient, encode_project_path};
pub use error::ApiError;
pub use project::Project;
