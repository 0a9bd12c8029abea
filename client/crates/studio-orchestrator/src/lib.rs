//! Environment and deployment lifecycle for studio projects.
//!
//! One [`ProjectSession`] per open project bundles:
//! - [`LifecycleController`]: sandbox status, health confirmation, preview start
//! - [`ReadinessWaiter`]: single-flight wait for a usable preview
//! - [`DeploymentController`] and [`ExternalDeployController`]: publishing
//! - [`RestoreCoordinator`]: propose, confirm or cancel a snapshot restore
//!
//! Push messages and user actions feed the controllers; state leaves through
//! watch channels and the workspace-wide [`EventBus`].

mod deployment;
mod error;
mod events;
mod external_deploy;
mod health_probe;
mod lifecycle;
mod preview_cache;
mod push;
mod readiness;
mod restore;
mod retry;
mod session;
mod status_store;

#[cfg(test)]
mod tests;

pub use deployment::{
    DeploymentController, DeploymentSnapshot, UnpublishTarget, normalize_subdomain,
    public_address,
};
pub use error::{OrchestratorError, Result as OrchestratorResult};
pub use events::{EventBus, EventSubscription, StudioEvent, StudioEventKind};
pub use external_deploy::{ExternalDeployController, ExternalDeploymentSnapshot};
pub use health_probe::HealthProbe;
pub use lifecycle::{
    LifecycleController, LifecycleEffect, LifecycleInput, LifecycleMachine, PollTicket,
    StatusReconciler, UserAction,
};
pub use preview_cache::PreviewCache;
pub use push::PushChannel;
pub use readiness::{ReadinessWaiter, WaitFailure};
pub use restore::{RestoreCoordinator, RestoreSnapshot};
pub use retry::{Backoff, IsRetryable, RetryPolicy, with_retry};
pub use session::{Backend, ProjectSession, Workspace};
pub use status_store::{StatusSnapshot, StatusStore};
