//! Authenticated HTTP client for project lookups and archive requests.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use super::{ApiError, Project};
use crate::config::ApiConfig;
use crate::user_agent;

/// Page size used by [`GitLabClient::list_all_projects`].
pub const CATALOG_PAGE_SIZE: u32 = 100;

const PRIVATE_TOKEN_HEADER: &str = "private-token";

/// Percent-encodes a namespaced path for use as a single URL segment.
///
/// `group/sub/project` becomes `group%2Fsub%2Fproject`.
#[must_use]
pub fn encode_project_path(path: &str) -> String {
    urlencoding::encode(path).into_owned()
}

/// Client for the hosting API.
///
/// Cheap to clone: the underlying `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct GitLabClient {
    client: Client,
    config: ApiConfig,
}

impl GitLabClient {
    /// Builds a client that sends `PRIVATE-TOKEN` on every request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the token is not a valid header
    /// value or the TLS backend cannot be initialized.
    #[instrument(level = "debug", skip(config), fields(base_url = %config.base_url()))]
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut token = HeaderValue::from_str(config.token())
            .map_err(|_| ApiError::client_build("token is not a valid HTTP header value"))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(PRIVATE_TOKEN_HEADER), token);

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(user_agent::default_user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::client_build(e.to_string()))?;

        debug!("created API client");
        Ok(Self { client, config })
    }

    /// Returns the configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Fetches a project by numeric identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or an
    /// undecodable body.
    #[instrument(skip(self))]
    pub async fn project_by_id(&self, id: u64) -> Result<Project, ApiError> {
        let url = format!("{}/projects/{id}", self.config.api_root());
        self.get_json(&url).await
    }

    /// Fetches a project by namespaced path (`group/project`).
    ///
    /// # Errors
    ///
    /// Same as [`project_by_id`](Self::project_by_id).
    #[instrument(skip(self))]
    pub async fn project_by_path(&self, path: &str) -> Result<Project, ApiError> {
        let url = format!(
            "{}/projects/{}",
            self.config.api_root(),
            encode_project_path(path)
        );
        self.get_json(&url).await
    }

    /// Runs the fuzzy project search and returns the result page as-is.
    ///
    /// # Errors
    ///
    /// Same as [`project_by_id`](Self::project_by_id).
    #[instrument(skip(self))]
    pub async fn search_projects(&self, text: &str) -> Result<Vec<Project>, ApiError> {
        let url = format!(
            "{}/projects?search={}",
            self.config.api_root(),
            urlencoding::encode(text)
        );
        self.get_json(&url).await
    }

    /// Fetches one page of the project catalog ordered by ascending id.
    ///
    /// # Errors
    ///
    /// Same as [`project_by_id`](Self::project_by_id).
    #[instrument(skip(self))]
    pub async fn list_projects_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Project>, ApiError> {
        let url = format!(
            "{}/projects?page={page}&per_page={per_page}&order_by=id&sort=asc",
            self.config.api_root()
        );
        self.get_json(&url).await
    }

    /// Walks the catalog page by page until an empty page is returned.
    ///
    /// # Errors
    ///
    /// Fails on the first page that cannot be fetched; partial results are
    /// discarded.
    #[instrument(skip(self))]
    pub async fn list_all_projects(&self) -> Result<Vec<Project>, ApiError> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let projects = self.list_projects_page(page, CATALOG_PAGE_SIZE).await?;
            if projects.is_empty() {
                break;
            }
            all.extend(projects);
            info!(fetched = all.len(), page, "fetched catalog page");
            page += 1;
        }
        info!(total = all.len(), "catalog listing complete");
        Ok(all)
    }

    /// URL of the zip archive for project `id`.
    #[must_use]
    pub fn archive_url(&self, id: u64) -> String {
        format!(
            "{}/projects/{id}/repository/archive.zip",
            self.config.api_root()
        )
    }

    /// Starts an archive request and returns the streaming response.
    ///
    /// Uses the archive timeout, which bounds the whole transfer including
    /// reading the body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-2xx status.
    #[instrument(skip(self))]
    pub async fn request_archive(&self, id: u64) -> Result<Response, ApiError> {
        let url = self.archive_url(id);
        self.send(&url, self.config.archive_timeout).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.send(url, self.config.api_timeout).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::decode(url, e))
    }

    async fn send(&self, url: &str, timeout: Duration) -> Result<Response, ApiError> {
        debug!(%url, "sending request");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "request returned error status");
            return Err(ApiError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

impl fmt::Debug for GitLabClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn project_json(id: u64, path_with_namespace: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": path_with_namespace.rsplit('/').next().unwrap(),
            "path_with_namespace": path_with_namespace,
        })
    }

    fn client_for(server: &MockServer) -> GitLabClient {
        GitLabClient::new(ApiConfig::new(&server.uri(), "secret-token").unwrap()).unwrap()
    }

    #[test]
    fn test_encode_project_path_encodes_slashes() {
        assert_eq!(encode_project_path("team/app"), "team%2Fapp");
        assert_eq!(encode_project_path("a/b/c"), "a%2Fb%2Fc");
        assert_eq!(encode_project_path("app"), "app");
    }

    #[test]
    fn test_new_rejects_token_with_newline() {
        let config = ApiConfig::new("https://git.example.com", "bad\ntoken").unwrap();
        let result = GitLabClient::new(config);
        assert!(matches!(result, Err(ApiError::ClientBuild { .. })));
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let config = ApiConfig::new("https://git.example.com", "secret-token").unwrap();
        let client = GitLabClient::new(config).unwrap();
        assert!(!format!("{client:?}").contains("secret-token"));
    }

    #[test]
    fn test_archive_url_shape() {
        let config = ApiConfig::new("https://git.example.com/", "t").unwrap();
        let client = GitLabClient::new(config).unwrap();
        assert_eq!(
            client.archive_url(42),
            "https://git.example.com/api/v4/projects/42/repository/archive.zip"
        );
    }

    #[tokio::test]
    async fn test_project_by_id_sends_private_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/42"))
            .and(header("PRIVATE-TOKEN", "secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_json(42, "team/app")))
            .expect(1)
            .mount(&server)
            .await;

        let project = client_for(&server).project_by_id(42).await.unwrap();
        assert_eq!(project.id, 42);
        assert_eq!(project.path_with_namespace, "team/app");
    }

    #[tokio::test]
    async fn test_project_by_id_404_is_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).project_by_id(9).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_project_by_id_bad_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/9"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).project_by_id(9).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_search_projects_encodes_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("search", "https://h/grp/proj.git"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([project_json(1, "grp/proj")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let results = client_for(&server)
            .search_projects("https://h/grp/proj.git")
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_list_all_projects_stops_at_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "100"))
            .and(query_param("order_by", "id"))
            .and(query_param("sort", "asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                project_json(1, "a/one"),
                project_json(2, "a/two"),
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([project_json(
                    3, "b/three"
                )])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let all = client_for(&server).list_all_projects().await.unwrap();
        let ids: Vec<u64> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
