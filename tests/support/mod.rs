//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::TcpListener;
use std::panic::Location;
use std::time::Duration;

use gitlab_backup_core::{ApiConfig, DownloadConfig, GitLabClient};
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

#[must_use]
pub fn socket_tests_required() -> bool {
    std::env::var("GITLAB_BACKUP_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

#[track_caller]
#[must_use]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let location = Location::caller();
    let message = format!(
        "[socket-bound-test] cannot bind localhost socket at {}:{}; mock-server test cannot run in this environment",
        location.file(),
        location.line()
    );
    if socket_tests_required() {
        panic!("{message}. Set GITLAB_BACKUP_REQUIRE_SOCKET_TESTS=0 to allow local skip behavior.");
    }

    eprintln!(
        "{message}. Skipping test. Set GITLAB_BACKUP_REQUIRE_SOCKET_TESTS=1 to fail-fast instead."
    );
    true
}

pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if should_skip_socket_bound_test() {
        None
    } else {
        Some(MockServer::start().await)
    }
}

/// Minimal project record as the API returns it.
pub fn project_json(id: u64, path_with_namespace: &str) -> serde_json::Value {
    let name = path_with_namespace.rsplit('/').next().unwrap_or_default();
    serde_json::json!({
        "id": id,
        "name": name,
        "path": name,
        "path_with_namespace": path_with_namespace,
        "web_url": format!("https://git.example.com/{path_with_namespace}"),
        "http_url_to_repo": format!("https://git.example.com/{path_with_namespace}.git"),
        "ssh_url_to_repo": format!("git@git.example.com:{path_with_namespace}.git"),
    })
}

pub fn client_for(base_url: &str) -> GitLabClient {
    GitLabClient::new(ApiConfig::new(base_url, TOKEN).unwrap()).unwrap()
}

/// Download config with a short backoff so retry tests stay fast.
pub fn fast_download_config(concurrency: usize) -> DownloadConfig {
    DownloadConfig::new(concurrency, 3, Duration::from_millis(20)).unwrap()
}
