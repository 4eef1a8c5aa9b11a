/// HTTP surface tests: trigger, read endpoints and file serving
mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{seed_version, TestApp, LAUNCHER};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

async fn send(app: &TestApp, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &TestApp, method: &str, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, method, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_reports_idle() {
    let app = TestApp::new().await;

    let (status, json) = send_json(&app, "GET", "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["scan_running"], false);
}

#[tokio::test]
async fn test_latest_is_empty_before_first_mirror() {
    let app = TestApp::new().await;

    let (status, json) = send_json(&app, "GET", "/api/launchers/demo/latest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["launcher"], LAUNCHER);
    assert_eq!(json["version"], "");
}

#[tokio::test]
async fn test_scan_mirrors_and_updates_latest() {
    let app = TestApp::new().await;

    let (status, summary) = send_json(&app, "POST", "/api/scan").await;
    assert_eq!(status, StatusCode::OK);

    let outcomes = summary["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0]["launcher"], LAUNCHER);
    assert_eq!(outcomes[0]["status"], "updated");
    assert_eq!(outcomes[0]["version"], "1.0.0");

    let (_, latest) = send_json(&app, "GET", "/api/launchers/demo/latest").await;
    assert_eq!(latest["version"], "1.0.0");

    // A second pass finds nothing new
    let (_, summary) = send_json(&app, "POST", "/api/scan").await;
    assert_eq!(summary["outcomes"][0]["status"], "up_to_date");
}

#[tokio::test]
async fn test_concurrent_scan_is_rejected() {
    let app = TestApp::with_resolver_delay(Duration::from_millis(500)).await;

    let first = {
        let router = app.router.clone();
        tokio::spawn(async move {
            router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/scan")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap()
                .status()
        })
    };

    // Wait until the first pass holds the permit
    while !app.orchestrator.is_running() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (status, json) = send_json(&app, "POST", "/api/scan").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Scan already in progress");

    let (_, health) = send_json(&app, "GET", "/api/health").await;
    assert_eq!(health["scan_running"], true);

    assert_eq!(first.await.unwrap(), StatusCode::OK);
    assert!(!app.orchestrator.is_running());
}

#[tokio::test]
async fn test_launcher_list_reflects_hydrated_state() {
    let app = TestApp::new().await;

    let (status, json) = send_json(&app, "GET", "/api/launchers").await;
    assert_eq!(status, StatusCode::OK);
    let launchers = json.as_array().unwrap();
    assert_eq!(launchers.len(), 1);
    assert_eq!(launchers[0]["name"], LAUNCHER);
    assert_eq!(launchers[0]["source_url"], "https://github.com/demo/demo");
    assert!(launchers[0]["version"].is_null());

    send(&app, "POST", "/api/scan").await;

    let (_, json) = send_json(&app, "GET", "/api/launchers").await;
    assert_eq!(json[0]["version"], "1.0.0");
    assert_eq!(json[0]["repo_url"], "https://github.com/demo/demo");
    assert!(json[0]["last_scan_at"].is_string());
}

#[tokio::test]
async fn test_versions_lists_history_newest_first() {
    let app = TestApp::new().await;
    seed_version(&app.index, "0.9.0", &app.manifest_path("0.9.0")).await;
    seed_version(&app.index, "1.0.0", &app.manifest_path("1.0.0")).await;

    let (status, json) = send_json(&app, "GET", "/api/launchers/demo/versions").await;

    assert_eq!(status, StatusCode::OK);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["version"], "1.0.0");
    assert_eq!(entries[0]["is_latest"], true);
    assert_eq!(entries[1]["version"], "0.9.0");
    assert_eq!(entries[1]["is_latest"], false);
}

#[tokio::test]
async fn test_versions_of_unknown_launcher_is_not_found() {
    let app = TestApp::new().await;

    let (status, json) = send_json(&app, "GET", "/api/launchers/ghost/versions").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_mirrored_files_are_served() {
    let app = TestApp::new().await;
    send(&app, "POST", "/api/scan").await;

    let (status, body) = send(&app, "GET", "/download/demo/1.0.0/demo.apk").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"hello");

    let (status, _) = send(&app, "GET", "/download/demo/2.0.0/demo.apk").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_disconnected_client_does_not_abort_scan() {
    let app = TestApp::with_resolver_delay(Duration::from_millis(300)).await;

    let request = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/scan")
            .body(Body::empty())
            .unwrap(),
    );
    assert!(tokio::time::timeout(Duration::from_millis(50), request)
        .await
        .is_err());

    // The pass keeps running after the request future is gone
    assert!(app.orchestrator.is_running());
    while app.orchestrator.is_running() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let (_, latest) = send_json(&app, "GET", "/api/launchers/demo/latest").await;
    assert_eq!(latest["version"], "1.0.0");
}

#[tokio::test]
async fn test_staging_files_are_not_served() {
    let app = TestApp::new().await;
    let staging = app.mirror_root.join(LAUNCHER).join(".partial").join("1.1.0-x");
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::write(staging.join("demo.apk"), b"half").unwrap();

    let (status, _) = send(&app, "GET", "/download/demo/.partial/1.1.0-x/demo.apk").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/download/demo/%2Epartial/1.1.0-x/demo.apk").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
