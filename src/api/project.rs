//! Canonical project record returned by the hosting API.

use serde::{Deserialize, Serialize};

/// A project as returned by `GET /projects/...`.
///
/// Only `id` and `path_with_namespace` are required; the remaining fields
/// default to empty strings when an instance omits them. Unknown fields in the
/// API payload are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Numeric identifier, unique and stable within the instance.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Browser URL of the project page.
    #[serde(default)]
    pub web_url: String,
    /// SSH clone URL.
    #[serde(default)]
    pub ssh_url_to_repo: String,
    /// HTTP(S) clone URL.
    #[serde(default)]
    pub http_url_to_repo: String,
    /// Short path (last segment of the namespaced path).
    #[serde(default)]
    pub path: String,
    /// Namespaced path, e.g. `group/subgroup/project`.
    pub path_with_namespace: String,
}

impl Project {
    /// Returns true if either clone URL equals `url` exactly.
    #[must_use]
    pub fn has_clone_url(&self, url: &str) -> bool {
        self.http_url_to_repo == url || self.ssh_url_to_repo == url
    }
}
