//! REST client for the studio backend and the traits the orchestrator
//! consumes it through.

mod api;
mod client;
mod error;
mod models;


pub use api::{DeploymentApi, ProjectApi, SnapshotApi};
pub use client::ApiClient;
pub use error::{ClientError, Result as ClientResult};
pub use models::deployment::{
    DeployRequest, DeploymentStatusResponse, SubdomainAvailability, UnpublishRequest,
};
pub use models::external_deployment::{
    ExternalConnectionStatus, ExternalDeployRequest, ExternalDeployResponse,
    ExternalDeploymentCurrent,
};
pub use models::project::{
    ErrorLogsResponse, HealthPayload, PreviewLogsResponse, PreviewStartResponse, ProjectInfo,
};
pub use models::snapshot::{CommitInfo, CommitsResponse, RestoreConfirmRequest, RestoreTempRequest};

/// Header carrying the acting user, when configured.
pub const USER_ID_HEADER: &str = "X-User-Id";
