use studio_core::BuildStatus;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// `POST /projects/{id}/vercel/deploy`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExternalDeployRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDeployResponse {
    pub deployment_id: String,
    #[serde(default)]
    pub deployment_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ExternalDeployResponse {
    pub fn build_status(&self) -> Option<BuildStatus> {
        self.status
            .as_deref()
            .and_then(|raw| BuildStatus::from_str(raw).ok())
    }
}

/// `GET /projects/{id}/vercel/deployment/current`
///
/// `has_deployment` turns false once the backend has finished tracking a
/// build; `last_deployment_url` then carries the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDeploymentCurrent {
    pub has_deployment: bool,
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub deployment_url: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub last_deployment_url: Option<String>,
}

impl ExternalDeploymentCurrent {
    pub fn build_status(&self) -> Option<BuildStatus> {
        self.status
            .as_deref()
            .and_then(|raw| BuildStatus::from_str(raw).ok())
    }
}

/// `GET /projects/{id}/vercel/status`
///
/// `connected` needs both an access token and a linked project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExternalConnectionStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "token_exists")]
    pub token_exists: bool,
    #[serde(default, alias = "project_connected")]
    pub project_connected: bool,
}

impl ExternalConnectionStatus {
    /// Why a deploy cannot go ahead, if it cannot.
    pub fn blocker(&self) -> Option<&'static str> {
        if self.connected {
            None
        } else if !self.token_exists {
            Some("no access token is configured for the hosting platform")
        } else if !self.project_connected {
            Some("the project is not linked to a hosting project")
        } else {
            Some("the hosting integration is disconnected")
        }
    }
}
