use studio_core::{DevServerHealthState, ProjectStatus};

use serde::{Deserialize, Serialize};

/// `GET /projects/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub dev_server_url: Option<String>,
}

impl ProjectInfo {
    /// Preview address reported by this response, `previewUrl` first.
    pub fn reported_preview_address(&self) -> Option<&str> {
        [self.preview_url.as_deref(), self.dev_server_url.as_deref()]
            .into_iter()
            .flatten()
            .find(|address| !address.trim().is_empty())
    }
}

/// `GET /projects/{id}/dev-server/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPayload {
    pub state: DevServerHealthState,
    #[serde(default)]
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub http_status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /projects/{id}/preview/start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStartResponse {
    #[serde(default)]
    pub url: Option<String>,
}

/// `GET /projects/{id}/preview/logs?lines=N`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PreviewLogsResponse {
    #[serde(default)]
    pub logs: String,
    #[serde(default)]
    pub running: bool,
}

/// `GET /projects/{id}/error-logs`
///
/// Everything the dev server wrote to stderr since it was started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogsResponse {
    #[serde(default)]
    pub logs: String,
    #[serde(default, alias = "project_id")]
    pub project_id: Option<String>,
}
