use crate::{
    ClientResult, CommitInfo, DeployRequest, DeploymentStatusResponse, ErrorLogsResponse,
    ExternalConnectionStatus, ExternalDeployResponse, ExternalDeploymentCurrent, HealthPayload,
    PreviewLogsResponse, PreviewStartResponse, ProjectInfo, RestoreConfirmRequest,
    SubdomainAvailability, UnpublishRequest,
};

use async_trait::async_trait;

/// Project, sandbox and preview endpoints.
#[async_trait]
pub trait ProjectApi: Send + Sync {
    async fn get_project(&self, project_id: &str) -> ClientResult<ProjectInfo>;

    /// `None` when the backend answers without a payload.
    async fn dev_server_health(&self, project_id: &str) -> ClientResult<Option<HealthPayload>>;

    async fn start_sandbox(&self, project_id: &str) -> ClientResult<()>;

    async fn start_preview(&self, project_id: &str) -> ClientResult<PreviewStartResponse>;

    async fn stop_preview(&self, project_id: &str) -> ClientResult<()>;

    /// Stop the dev server if running and start it again.
    async fn restart_preview(&self, project_id: &str) -> ClientResult<PreviewStartResponse>;

    /// Last `lines` lines of dev-server output.
    async fn preview_logs(&self, project_id: &str, lines: u32) -> ClientResult<PreviewLogsResponse>;

    async fn error_logs(&self, project_id: &str) -> ClientResult<ErrorLogsResponse>;
}

/// Publish endpoints, both the hosted subdomain and the external build platform.
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    async fn check_subdomain(&self, subdomain: &str) -> ClientResult<SubdomainAvailability>;

    async fn deploy(&self, project_id: &str, request: &DeployRequest) -> ClientResult<()>;

    async fn deployment_status(&self, project_id: &str) -> ClientResult<DeploymentStatusResponse>;

    async fn unpublish(&self, project_id: &str, request: &UnpublishRequest) -> ClientResult<()>;

    async fn external_deploy(
        &self,
        project_id: &str,
        branch: Option<&str>,
    ) -> ClientResult<ExternalDeployResponse>;

    async fn external_deployment(&self, project_id: &str)
    -> ClientResult<ExternalDeploymentCurrent>;

    async fn external_status(&self, project_id: &str) -> ClientResult<ExternalConnectionStatus>;
}

/// Snapshot history and restore endpoints.
#[async_trait]
pub trait SnapshotApi: Send + Sync {
    async fn commits(&self, project_id: &str, limit: u32) -> ClientResult<Vec<CommitInfo>>;

    async fn restore_temp(
        &self,
        project_id: &str,
        snapshot_id: &str,
        temporary: bool,
    ) -> ClientResult<()>;

    async fn restore_confirm(
        &self,
        project_id: &str,
        request: &RestoreConfirmRequest,
    ) -> ClientResult<()>;

    async fn restore_cancel(&self, project_id: &str) -> ClientResult<()>;
}
