//! Integration tests for the REST client using wiremock mock server

use studio_client::{
    ApiClient, DeployRequest, DeploymentApi, ProjectApi, RestoreConfirmRequest, SnapshotApi,
    UnpublishRequest,
};
use studio_config::ApiConfig;
use studio_core::{BuildStatus, DevServerHealthState, ProjectStatus};

use std::time::Duration;

use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

#[tokio::test]
async fn test_get_project_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "status": "active",
            "previewUrl": "https://p1.example"
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let project = client.get_project("p1").await.unwrap();

    assert_eq!(project.status, ProjectStatus::Active);
    assert_eq!(project.preview_url.as_deref(), Some("https://p1.example"));
    assert_eq!(project.dev_server_url, None);
}

#[tokio::test]
async fn test_user_id_header_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1"))
        .and(header("X-User-Id", "user-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "stopped"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&format!("{}/", mock_server.uri()), Some("user-7"));
    let project = client.get_project("p1").await.unwrap();

    assert_eq!(project.status, ProjectStatus::Stopped);
}

#[tokio::test]
async fn test_get_project_not_found_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Project not found"})),
        )
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let err = client.get_project("missing").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), "Project not found");
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_health_with_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/dev-server/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "ready",
            "latencyMs": 42,
            "httpStatus": 200
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let payload = client.dev_server_health("p1").await.unwrap().unwrap();

    assert_eq!(payload.state, DevServerHealthState::Ready);
    assert_eq!(payload.latency_ms, Some(42));
    assert_eq!(payload.http_status, Some(200));
}

#[tokio::test]
async fn test_health_no_content_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/dev-server/health"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let payload = client.dev_server_health("p1").await.unwrap();

    assert!(payload.is_none());
}

#[tokio::test]
async fn test_health_times_out_with_configured_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/dev-server/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"state": "ready"}))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&mock_server)
        .await;

    let config = ApiConfig {
        base_url: mock_server.uri(),
        health_timeout_ms: 200,
        ..ApiConfig::default()
    };
    let client = ApiClient::from_config(&config).unwrap();
    let err = client.dev_server_health("p1").await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.user_message(), "The server took too long to respond");
}

#[tokio::test]
async fn test_start_preview_empty_body_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/p1/preview/start"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let response = client.start_preview("p1").await.unwrap();

    assert_eq!(response.url, None);
}

#[tokio::test]
async fn test_deploy_sends_camel_case_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/p1/deploy"))
        .and(body_json(json!({"subdomainName": "my-app", "customDomainId": "cd_1"})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "pending"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let request = DeployRequest {
        subdomain_name: "my-app".into(),
        custom_domain_id: Some("cd_1".into()),
    };

    client.deploy("p1", &request).await.unwrap();
}

#[tokio::test]
async fn test_deployment_status_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/deployment-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "deployed",
            "subdomainName": "my-app",
            "url": "https://my-app.studio.app"
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let status = client.deployment_status("p1").await.unwrap();

    assert_eq!(status.build_status(), Some(BuildStatus::Success));
    assert_eq!(status.subdomain_name.as_deref(), Some("my-app"));
}

#[tokio::test]
async fn test_subdomain_availability() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subdomains/taken/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"available": false})))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let availability = client.check_subdomain("taken").await.unwrap();

    assert!(!availability.available);
}

#[tokio::test]
async fn test_unpublish_custom_domain_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/p1/unpublish"))
        .and(body_json(json!({"customDomainId": "cd_9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    client
        .unpublish("p1", &UnpublishRequest::custom_domain("cd_9"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_external_deploy_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/p1/vercel/deploy"))
        .and(body_json(json!({"branch": "main"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deploymentId": "dpl_1",
            "deploymentUrl": "https://p1.vercel.app",
            "status": "QUEUED"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/vercel/deployment/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hasDeployment": true,
            "deploymentId": "dpl_1",
            "status": "BUILDING",
            "logs": ["Installing dependencies"]
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let started = client.external_deploy("p1", Some("main")).await.unwrap();
    let current = client.external_deployment("p1").await.unwrap();

    assert_eq!(started.deployment_id, "dpl_1");
    assert_eq!(started.build_status(), Some(BuildStatus::Pending));
    assert_eq!(current.build_status(), Some(BuildStatus::Building));
    assert_eq!(current.logs, vec!["Installing dependencies".to_string()]);
}

#[tokio::test]
async fn test_commits_with_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/commits"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "commits": [{"id": "abc123", "message": "Add header"}]
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let commits = client.commits("p1", 1).await.unwrap();

    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].id, "abc123");
}

#[tokio::test]
async fn test_restore_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/p1/snapshots/restore"))
        .and(body_json(json!({"snapshotId": "snap-a", "temporary": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/projects/p1/snapshots/restore/confirm"))
        .and(body_json(json!({"snapshotId": "snap-a", "sessionId": "s1"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    client.restore_temp("p1", "snap-a", true).await.unwrap();
    client
        .restore_confirm(
            "p1",
            &RestoreConfirmRequest {
                snapshot_id: "snap-a".into(),
                session_id: Some("s1".into()),
                chat_room_id: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_restore_cancel_unsupported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/p1/snapshots/restore/cancel"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let err = client.restore_cancel("p1").await.unwrap_err();

    assert!(err.is_unsupported());
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    // Nothing listens on port 9 locally
    let client = ApiClient::new("http://127.0.0.1:9", None);
    let err = client.get_project("p1").await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.user_message(), "Could not reach the server");
}

#[tokio::test]
async fn test_preview_logs_with_line_count() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/preview/logs"))
        .and(query_param("lines", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": "ready in 312 ms\npage reload",
            "running": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let logs = client.preview_logs("p1", 25).await.unwrap();

    assert!(logs.running);
    assert_eq!(logs.logs, "ready in 312 ms\npage reload");
}

#[tokio::test]
async fn test_error_logs_snake_case_project_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/error-logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": "TypeError: x is undefined",
            "project_id": "p1"
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let logs = client.error_logs("p1").await.unwrap();

    assert_eq!(logs.logs, "TypeError: x is undefined");
    assert_eq!(logs.project_id.as_deref(), Some("p1"));
}

#[tokio::test]
async fn test_restart_preview_returns_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/p1/preview/restart"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "https://p1.example"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let preview = client.restart_preview("p1").await.unwrap();

    assert_eq!(preview.url.as_deref(), Some("https://p1.example"));
}

#[tokio::test]
async fn test_external_status_not_linked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/vercel/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connected": false,
            "status": "disconnected",
            "token_exists": true,
            "project_connected": false
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), None);
    let status = client.external_status("p1").await.unwrap();

    assert!(!status.connected);
    assert!(status.token_exists);
    assert!(!status.project_connected);
    assert_eq!(
        status.blocker(),
        Some("the project is not linked to a hosting project")
    );
}
