//! Router-level tests driven through `tower::ServiceExt::oneshot`.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use host_agent_server::{AppState, BearerAuth, router};
use host_agent_tools::{BackupRunner, FileRetrievalService, RipgrepRunner, SearchService};
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

const TOKEN: &str = "test-token";

struct Fixture {
    dir: TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let root = dir.path().join("corpus");
        let docs = root.join("n8n-docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.md"), "# A\nCreate a workflow\n").unwrap();
        fs::write(dir.path().join("outside.txt"), "secret").unwrap();

        // Fake ripgrep: one match in a.md, reported under whatever root it is given.
        let rg = dir.path().join("rg");
        write_script(
            &rg,
            "#!/bin/sh\n\
             for last; do :; done\n\
             printf '%s\\n' \"{\\\"type\\\":\\\"match\\\",\\\"data\\\":{\\\"path\\\":{\\\"text\\\":\\\"$last/a.md\\\"},\\\"lines\\\":{\\\"text\\\":\\\"Create a workflow\\\\n\\\"},\\\"line_number\\\":2,\\\"absolute_offset\\\":4,\\\"submatches\\\":[]}}\"\n\
             exit 0\n",
        );
        write_script(&dir.path().join("slow-rg"), "#!/bin/sh\nsleep 30\n");
        write_script(&dir.path().join("backup.sh"), "echo 'pushed 2 workflows'\n");

        Self { dir, root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn app_with(&self, rg: &str, search_timeout: Duration, backup_script: &Path) -> Router {
        router(AppState {
            search: SearchService::new(&self.root, RipgrepRunner::new(self.path(rg), search_timeout)),
            files: FileRetrievalService::new(&self.root),
            backup: BackupRunner::new(backup_script, Duration::from_secs(10)),
            auth: BearerAuth::new(TOKEN),
        })
    }

    fn app(&self) -> Router {
        self.app_with("rg", Duration::from_secs(10), &self.path("backup.sh"))
    }
}

fn write_script(path: &Path, content: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, content).expect("write script");
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("set executable bit");
}

fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_needs_no_token() {
    let fixture = Fixture::new();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(fixture.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "service": "HostAgent"}));
}

#[tokio::test]
async fn protected_routes_reject_missing_or_wrong_token() {
    let fixture = Fixture::new();
    let body = r#"{"query": "workflow", "directory": "n8n-docs"}"#;

    for token in [None, Some("wrong")] {
        for uri in ["/search", "/get_files", "/backup/n8n"] {
            let (status, response) = send(fixture.app(), post_json(uri, token, body)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} with {token:?}");
            assert_eq!(response["detail"], "Invalid authentication token");
            assert!(response["timestamp"].is_string());
        }
    }
}

#[tokio::test]
async fn search_returns_grouped_matches() {
    let fixture = Fixture::new();
    let request = post_json(
        "/search",
        Some(TOKEN),
        r#"{"query": "workflow", "directory": "n8n-docs", "max_results": 5, "context_lines": 0}"#,
    );
    let (status, body) = send(fixture.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "results": [{
                "file": "a.md",
                "matches": [{
                    "line_number": 2,
                    "content": "Create a workflow",
                    "context_before": [],
                    "context_after": []
                }]
            }],
            "total_matches": 1,
            "truncated": false
        })
    );
}

#[tokio::test]
async fn search_rejects_unknown_directory() {
    let fixture = Fixture::new();
    let request = post_json(
        "/search",
        Some(TOKEN),
        r#"{"query": "root", "directory": "etc"}"#,
    );
    let (status, body) = send(fixture.app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid directory: etc");
}

#[tokio::test]
async fn search_rejects_blank_query_and_bad_json() {
    let fixture = Fixture::new();

    let blank = post_json(
        "/search",
        Some(TOKEN),
        r#"{"query": "   ", "directory": "n8n-docs"}"#,
    );
    let (status, _) = send(fixture.app(), blank).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let broken = post_json("/search", Some(TOKEN), r#"{"query": "#);
    let (status, body) = send(fixture.app(), broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn search_of_missing_directory_is_not_found() {
    let fixture = Fixture::new();
    let request = post_json(
        "/search",
        Some(TOKEN),
        r#"{"query": "workflow", "directory": "n8n-nodes-only"}"#,
    );
    let (status, body) = send(fixture.app(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().starts_with("Directory not found"));
}

#[tokio::test]
async fn slow_search_is_gateway_timeout() {
    let fixture = Fixture::new();
    let app = fixture.app_with(
        "slow-rg",
        Duration::from_millis(300),
        &fixture.path("backup.sh"),
    );
    let request = post_json(
        "/search",
        Some(TOKEN),
        r#"{"query": "workflow", "directory": "n8n-docs"}"#,
    );
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn get_files_splits_successes_and_errors() {
    let fixture = Fixture::new();
    let request = post_json(
        "/get_files",
        Some(TOKEN),
        r#"{"directory": "n8n-docs", "files": ["a.md", "missing.md", "../../outside.txt"]}"#,
    );
    let (status, body) = send(fixture.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["files"],
        json!([{"path": "a.md", "content": "# A\nCreate a workflow\n", "size": 22}])
    );
    assert_eq!(
        body["errors"],
        json!([
            {"file": "missing.md", "error": "File not found", "code": "not_found"},
            {"file": "../../outside.txt", "error": "Path traversal attempt detected", "code": "path_traversal"}
        ])
    );
}

#[tokio::test]
async fn get_files_rejects_oversized_request() {
    let fixture = Fixture::new();
    let files: Vec<String> = (0..21).map(|i| format!("f{i}.md")).collect();
    let body = json!({"directory": "n8n-docs", "files": files}).to_string();
    let (status, response) = send(fixture.app(), post_json("/get_files", Some(TOKEN), &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response["detail"],
        "Maximum 20 files can be retrieved at once (requested 21)"
    );
}

#[tokio::test]
async fn backup_reports_script_output() {
    let fixture = Fixture::new();
    let (status, body) = send(fixture.app(), post_json("/backup/n8n", Some(TOKEN), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "N8N workflows backed up successfully");
    assert_eq!(body["output"], "pushed 2 workflows");
}

#[tokio::test]
async fn backup_failure_is_server_error() {
    let fixture = Fixture::new();
    let app = fixture.app_with("rg", Duration::from_secs(10), &fixture.path("missing.sh"));
    let (status, body) = send(app, post_json("/backup/n8n", Some(TOKEN), "")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Backup operation failed: Backup script not found")
    );
}
