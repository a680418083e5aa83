//! End-to-end backup runs against a mock API.

#![allow(clippy::unwrap_used)]

mod support;

use chrono::NaiveDate;
use gitlab_backup_core::download::ARCHIVE_FILE_NAME;
use gitlab_backup_core::{BackupError, BackupLayout, Orchestrator, ResolveError};
use support::{client_for, fast_download_config, project_json, start_mock_server_or_skip};
use tempfile::TempDir;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn layout(root: &TempDir) -> BackupLayout {
    BackupLayout::for_date(root.path(), NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
}

async fn mount_project_with_archive(server: &MockServer, id: u64, path_with_namespace: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v4/projects/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json(id, path_with_namespace)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v4/projects/{id}/repository/archive.zip")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_numeric_reference_ends_up_as_archive_under_namespace() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let body = vec![0xAB_u8; 4096];
    mount_project_with_archive(&server, 42, "team/app", &body).await;

    let root = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(client_for(&server.uri()), &fast_download_config(2), layout(&root));

    let summary = orchestrator.run(&["42"]).await.unwrap();

    assert!(summary.succeeded());
    assert_eq!(summary.downloads.completed(), 1);
    let archive = root
        .path()
        .join("20260314/repositories/team/app")
        .join(ARCHIVE_FILE_NAME);
    assert_eq!(std::fs::metadata(&archive).unwrap().len(), 4096);
}

#[tokio::test]
async fn test_run_writes_summary_and_report_files() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_project_with_archive(&server, 1, "g/one", b"one").await;
    mount_project_with_archive(&server, 2, "g/two", b"two").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(client_for(&server.uri()), &fast_download_config(2), layout(&root));

    let summary = orchestrator
        .run(&["1", "no/such-project", "2"])
        .await
        .unwrap();

    assert_eq!(summary.resolution.resolved.len(), 2);
    assert_eq!(summary.resolution.skipped.len(), 1);
    assert_eq!(summary.downloads.completed(), 2);

    let reports = orchestrator.layout().reports_dir();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(reports.join("projects.json")).unwrap())
            .unwrap();
    assert_eq!(json["total_projects"], 2);
    assert!(reports.join("projects.txt").is_file());

    let report = std::fs::read_to_string(reports.join("backup_report.txt")).unwrap();
    assert!(report.contains("Backup date: 20260314"), "{report}");
}

#[tokio::test]
async fn test_rerun_on_same_day_skips_existing_archives() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_project_with_archive(&server, 5, "ops/tool", b"tool-archive").await;

    let root = TempDir::new().unwrap();
    let config = fast_download_config(1);

    let first = Orchestrator::new(client_for(&server.uri()), &config, layout(&root))
        .run(&["5"])
        .await
        .unwrap();
    assert_eq!(first.downloads.completed(), 1);

    let second = Orchestrator::new(client_for(&server.uri()), &config, layout(&root))
        .run(&["5"])
        .await
        .unwrap();
    assert_eq!(second.downloads.completed(), 0);
    assert_eq!(second.downloads.skipped_existing(), 1);
    assert!(second.succeeded());
}

#[tokio::test]
async fn test_nothing_resolvable_fails_the_run() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(client_for(&server.uri()), &fast_download_config(1), layout(&root));

    let err = orchestrator.run(&["ghost/one", "ghost/two"]).await.unwrap_err();

    assert!(
        matches!(err, BackupError::Resolve(ResolveError::NothingResolved { total: 2 })),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_all_downloads_failing_marks_run_unsuccessful() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json(9, "g/flaky")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/9/repository/archive.zip"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(client_for(&server.uri()), &fast_download_config(1), layout(&root));

    let summary = orchestrator.run(&["9"]).await.unwrap();

    assert!(!summary.succeeded());
    assert_eq!(summary.downloads.failed(), 1);
    assert_eq!(summary.downloads.retried(), 2);
}

#[tokio::test]
async fn test_references_to_the_same_project_download_once() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let clone_url = "https://git.example.com/team/app.git";
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json(42, "team/app")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects"))
        .and(query_param("search", clone_url))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([project_json(42, "team/app")])),
        )
        .mount(&server)
        .await;
    // Slow enough that two tasks for the same project would overlap.
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/repository/archive.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"single-archive".to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(client_for(&server.uri()), &fast_download_config(5), layout(&root));

    let summary = orchestrator.run(&["42", clone_url, "42"]).await.unwrap();

    assert_eq!(summary.resolution.resolved.len(), 3);
    assert_eq!(summary.resolution.duplicates().len(), 2);
    assert_eq!(summary.downloads.total(), 1);
    assert_eq!(summary.downloads.completed(), 1);
    assert_eq!(summary.downloads.failed(), 0);

    let project_dir = orchestrator.layout().projects_dir().join("team/app");
    assert_eq!(
        std::fs::read(project_dir.join(ARCHIVE_FILE_NAME)).unwrap(),
        b"single-archive"
    );
    let report =
        std::fs::read_to_string(orchestrator.layout().reports_dir().join("backup_report.txt")).unwrap();
    assert!(report.contains("Total projects: 1"), "{report}");
}
