//! Messages delivered on a project's push channel.
//!
//! Every frame is a JSON object tagged by `type`; payload fields use
//! camelCase, matching the REST API.

use crate::{BuildStatus, CoreError, CoreResult, ProjectStatus};

use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    ProjectStatus(ProjectStatusPush),
    DeploymentStatus(DeploymentPush),
    Restore(RestorePush),
    SnapshotDiff(SnapshotDiffPush),
    ServerRestart(ServerRestartPush),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusPush {
    pub project_id: String,
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPush {
    pub project_id: String,
    pub status: BuildStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A snapshot was restored by someone other than this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePush {
    pub project_id: String,
    pub snapshot_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// An agent turn changed files in the sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDiffPush {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub files_changed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRestartPush {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl PushMessage {
    /// Parse one text frame.
    #[track_caller]
    pub fn parse(text: &str) -> CoreResult<Self> {
        serde_json::from_str(text).map_err(|source| CoreError::PushMessage {
            source,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Project the message is addressed to. Server restarts may be global.
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::ProjectStatus(push) => Some(&push.project_id),
            Self::DeploymentStatus(push) => Some(&push.project_id),
            Self::Restore(push) => Some(&push.project_id),
            Self::SnapshotDiff(push) => Some(&push.project_id),
            Self::ServerRestart(push) => push.project_id.as_deref(),
        }
    }

    /// Whether a subscriber for `project_id` should act on this message.
    pub fn is_for(&self, project_id: &str) -> bool {
        self.project_id().is_none_or(|id| id == project_id)
    }
}
