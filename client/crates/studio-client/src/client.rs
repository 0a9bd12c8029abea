use crate::api::{DeploymentApi, ProjectApi, SnapshotApi};
use crate::{
    ClientError, ClientResult, CommitInfo, CommitsResponse, DeployRequest,
    DeploymentStatusResponse, ErrorLogsResponse, ExternalConnectionStatus, ExternalDeployRequest,
    ExternalDeployResponse, ExternalDeploymentCurrent, HealthPayload, PreviewLogsResponse,
    PreviewStartResponse, ProjectInfo, RestoreConfirmRequest, RestoreTempRequest, SubdomainAvailability, USER_ID_HEADER,
    UnpublishRequest,
};

use studio_config::ApiConfig;

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the studio REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub base_url: String,
    pub user_id: Option<String>,
    health_timeout: Duration,
    client: ReqwestClient,
}

impl ApiClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Server URL (e.g., "http://127.0.0.1:8080")
    /// * `user_id` - Optional user ID to include in X-User-Id header
    pub fn new(base_url: &str, user_id: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.map(String::from),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            client: ReqwestClient::new(),
        }
    }

    /// Create a client with the configured request and health timeouts
    pub fn from_config(config: &ApiConfig) -> ClientResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            health_timeout: config.health_timeout(),
            client,
        })
    }

    /// Build a request with optional user ID header
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);

        if let Some(ref user_id) = self.user_id {
            req = req.header(USER_ID_HEADER, user_id);
        }

        req
    }

    /// Send the request and return the raw body of a successful response
    async fn send(&self, req: reqwest::RequestBuilder) -> ClientResult<(StatusCode, String)> {
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let error = api_error_from_body(status.as_u16(), &text);
            debug!("Request failed: {error}");
            return Err(error);
        }

        Ok((status, text))
    }

    /// Execute request and decode the JSON body
    async fn execute<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> ClientResult<T> {
        let (_, text) = self.send(req).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Execute request; `None` for 204 or an empty body
    async fn execute_optional<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> ClientResult<Option<T>> {
        let (status, text) = self.send(req).await?;
        if status == StatusCode::NO_CONTENT || is_empty_body(&text) {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Execute request and ignore whatever body comes back
    async fn execute_unit(&self, req: reqwest::RequestBuilder) -> ClientResult<()> {
        self.send(req).await.map(|_| ())
    }
}

/// Empty, whitespace-only and JSON `null` bodies carry no payload.
fn is_empty_body(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == "null"
}

/// Translate an error response into [`ClientError::Api`].
///
/// Understands `{"error": {"code", "message"}}` and `{"detail": "..."}`;
/// anything else keeps the HTTP status as the only information.
pub(crate) fn api_error_from_body(status: u16, text: &str) -> ClientError {
    let fallback_code = format!("HTTP_{status}");
    let body: Option<Value> = serde_json::from_str(text).ok();

    if let Some(error) = body.as_ref().and_then(|b| b.get("error")) {
        let code = error
            .get("code")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or(fallback_code);
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        return ClientError::api_error(status, code, message);
    }

    if let Some(detail) = body.as_ref().and_then(|b| b.get("detail")) {
        let message = match detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        return ClientError::api_error(status, fallback_code, message);
    }

    let message = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Request failed")
        .to_string();
    ClientError::api_error(status, fallback_code, message)
}

// =========================================================================
// Project Operations
// =========================================================================

#[async_trait]
impl ProjectApi for ApiClient {
    async fn get_project(&self, project_id: &str) -> ClientResult<ProjectInfo> {
        let req = self.request(Method::GET, &format!("/projects/{}", project_id));
        self.execute(req).await
    }

    async fn dev_server_health(&self, project_id: &str) -> ClientResult<Option<HealthPayload>> {
        let req = self
            .request(
                Method::GET,
                &format!("/projects/{}/dev-server/health", project_id),
            )
            .timeout(self.health_timeout);
        self.execute_optional(req).await
    }

    async fn start_sandbox(&self, project_id: &str) -> ClientResult<()> {
        let req = self.request(
            Method::POST,
            &format!("/projects/{}/sandbox/start", project_id),
        );
        self.execute_unit(req).await
    }

    async fn start_preview(&self, project_id: &str) -> ClientResult<PreviewStartResponse> {
        let req = self.request(
            Method::POST,
            &format!("/projects/{}/preview/start", project_id),
        );
        Ok(self.execute_optional(req).await?.unwrap_or_default())
    }

    async fn stop_preview(&self, project_id: &str) -> ClientResult<()> {
        let req = self.request(
            Method::POST,
            &format!("/projects/{}/preview/stop", project_id),
        );
        self.execute_unit(req).await
    }

    async fn restart_preview(&self, project_id: &str) -> ClientResult<PreviewStartResponse> {
        let req = self.request(
            Method::POST,
            &format!("/projects/{}/preview/restart", project_id),
        );
        Ok(self.execute_optional(req).await?.unwrap_or_default())
    }

    async fn preview_logs(&self, project_id: &str, lines: u32) -> ClientResult<PreviewLogsResponse> {
        let req = self.request(
            Method::GET,
            &format!("/projects/{}/preview/logs?lines={}", project_id, lines),
        );
        self.execute(req).await
    }

    async fn error_logs(&self, project_id: &str) -> ClientResult<ErrorLogsResponse> {
        let req = self.request(
            Method::GET,
            &format!("/projects/{}/error-logs", project_id),
        );
        Ok(self.execute_optional(req).await?.unwrap_or_default())
    }
}

// =========================================================================
// Deployment Operations
// =========================================================================

#[async_trait]
impl DeploymentApi for ApiClient {
    async fn check_subdomain(&self, subdomain: &str) -> ClientResult<SubdomainAvailability> {
        let req = self.request(
            Method::GET,
            &format!("/subdomains/{}/availability", subdomain),
        );
        self.execute(req).await
    }

    async fn deploy(&self, project_id: &str, request: &DeployRequest) -> ClientResult<()> {
        let req = self
            .request(Method::POST, &format!("/projects/{}/deploy", project_id))
            .json(request);
        self.execute_unit(req).await
    }

    async fn deployment_status(&self, project_id: &str) -> ClientResult<DeploymentStatusResponse> {
        let req = self.request(
            Method::GET,
            &format!("/projects/{}/deployment-status", project_id),
        );
        Ok(self.execute_optional(req).await?.unwrap_or_default())
    }

    async fn unpublish(&self, project_id: &str, request: &UnpublishRequest) -> ClientResult<()> {
        let req = self
            .request(Method::POST, &format!("/projects/{}/unpublish", project_id))
            .json(request);
        self.execute_unit(req).await
    }

    async fn external_deploy(
        &self,
        project_id: &str,
        branch: Option<&str>,
    ) -> ClientResult<ExternalDeployResponse> {
        let body = ExternalDeployRequest {
            branch: branch.map(String::from),
        };
        let req = self
            .request(
                Method::POST,
                &format!("/projects/{}/vercel/deploy", project_id),
            )
            .json(&body);
        self.execute(req).await
    }

    async fn external_deployment(
        &self,
        project_id: &str,
    ) -> ClientResult<ExternalDeploymentCurrent> {
        let req = self.request(
            Method::GET,
            &format!("/projects/{}/vercel/deployment/current", project_id),
        );
        self.execute(req).await
    }

    async fn external_status(&self, project_id: &str) -> ClientResult<ExternalConnectionStatus> {
        let req = self.request(
            Method::GET,
            &format!("/projects/{}/vercel/status", project_id),
        );
        self.execute(req).await
    }
}

// =========================================================================
// Snapshot Operations
// =========================================================================

#[async_trait]
impl SnapshotApi for ApiClient {
    async fn commits(&self, project_id: &str, limit: u32) -> ClientResult<Vec<CommitInfo>> {
        let req = self.request(
            Method::GET,
            &format!("/projects/{}/commits?limit={}", project_id, limit),
        );
        let response: CommitsResponse = self.execute(req).await?;
        Ok(response.commits)
    }

    async fn restore_temp(
        &self,
        project_id: &str,
        snapshot_id: &str,
        temporary: bool,
    ) -> ClientResult<()> {
        let body = RestoreTempRequest {
            snapshot_id: snapshot_id.to_string(),
            temporary,
        };
        let req = self
            .request(
                Method::POST,
                &format!("/projects/{}/snapshots/restore", project_id),
            )
            .json(&body);
        self.execute_unit(req).await
    }

    async fn restore_confirm(
        &self,
        project_id: &str,
        request: &RestoreConfirmRequest,
    ) -> ClientResult<()> {
        let req = self
            .request(
                Method::POST,
                &format!("/projects/{}/snapshots/restore/confirm", project_id),
            )
            .json(request);
        self.execute_unit(req).await
    }

    async fn restore_cancel(&self, project_id: &str) -> ClientResult<()> {
        let req = self.request(
            Method::POST,
            &format!("/projects/{}/snapshots/restore/cancel", project_id),
        );
        self.execute_unit(req).await
    }
}
