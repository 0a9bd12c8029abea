pub mod error;
pub mod models;
pub mod push;

#[cfg(test)]
mod tests;

pub use error::{CoreError, Result as CoreResult};
pub use models::build_status::BuildStatus;
pub use models::deployment_state::DeploymentState;
pub use models::health_result::HealthResult;
pub use models::health_state::DevServerHealthState;
pub use models::notice::{LifecycleNotice, NoticeLevel};
pub use models::preview::{has_preview_address, preview_ready};
pub use models::project_status::ProjectStatus;
pub use models::restore_state::RestoreState;
pub use push::push_message::{
    DeploymentPush, ProjectStatusPush, PushMessage, RestorePush, ServerRestartPush,
    SnapshotDiffPush,
};
