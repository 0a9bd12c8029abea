//! Builds on the third-party hosting platform.
//!
//! The backend tracks one build at a time. While it is running,
//! `deployment/current` reports it with `has_deployment: true`; once the
//! backend stops tracking it the flag drops to false and only the last URL
//! is left.

use crate::events::{EventBus, StudioEventKind};
use crate::status_store::{StatusStore, wait_for_failure};
use crate::{OrchestratorError, OrchestratorResult};

use studio_client::{DeploymentApi, ExternalDeploymentCurrent};
use studio_config::DeploymentConfig;
use studio_core::BuildStatus;

use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExternalDeploymentSnapshot {
    pub status: Option<BuildStatus>,
    pub deployment_id: Option<String>,
    pub url: Option<String>,
    /// Raw build output, latest poll wins
    pub logs: Vec<String>,
    pub error: Option<String>,
}

impl ExternalDeploymentSnapshot {
    pub fn is_building(&self) -> bool {
        matches!(
            self.status,
            Some(BuildStatus::Pending | BuildStatus::Building)
        )
    }
}

pub struct ExternalDeployController {
    project_id: String,
    deployments: Arc<dyn DeploymentApi>,
    status: StatusStore,
    events: EventBus,
    config: DeploymentConfig,
    state: watch::Sender<ExternalDeploymentSnapshot>,
}

impl ExternalDeployController {
    pub fn new(
        project_id: &str,
        deployments: Arc<dyn DeploymentApi>,
        status: StatusStore,
        events: EventBus,
        config: DeploymentConfig,
    ) -> Self {
        let (state, _) = watch::channel(ExternalDeploymentSnapshot::default());
        Self {
            project_id: project_id.to_string(),
            deployments,
            status,
            events,
            config,
            state,
        }
    }

    pub fn snapshot(&self) -> ExternalDeploymentSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExternalDeploymentSnapshot> {
        self.state.subscribe()
    }

    /// Trigger a build and poll it to completion.
    ///
    /// Nothing is started unless the integration reports itself connected.
    pub async fn deploy(&self, branch: Option<&str>) -> OrchestratorResult<ExternalDeploymentSnapshot> {
        if self.snapshot().is_building() {
            return Err(OrchestratorError::deployment_in_flight());
        }
        self.ensure_connected().await?;
        self.begin()?;

        let response = match self.deployments.external_deploy(&self.project_id, branch).await {
            Ok(response) => response,
            Err(e) => {
                let err = OrchestratorError::from(e);
                self.fail(err.user_message());
                return Err(err);
            }
        };

        info!(
            "External build {} started for {}",
            response.deployment_id, self.project_id
        );
        let status = response.build_status().unwrap_or(BuildStatus::Pending);
        self.update(|s| {
            s.deployment_id = Some(response.deployment_id.clone());
            s.url = response.deployment_url.clone();
            s.status = Some(status);
        });

        match status {
            BuildStatus::Success => Ok(self.snapshot()),
            BuildStatus::Failed => Err(self.failed_build(None)),
            BuildStatus::Pending | BuildStatus::Building => self.poll_until_terminal().await,
        }
    }

    /// Hydrate from the backend. Leaves a running deploy alone.
    pub async fn refresh(&self) -> OrchestratorResult<ExternalDeploymentSnapshot> {
        if self.snapshot().is_building() {
            return Ok(self.snapshot());
        }

        let current = self.deployments.external_deployment(&self.project_id).await?;
        if current.has_deployment {
            self.absorb(&current);
        } else if current.last_deployment_url.is_some() {
            self.update(|s| s.url = current.last_deployment_url.clone());
        }
        Ok(self.snapshot())
    }

    async fn ensure_connected(&self) -> OrchestratorResult<()> {
        let connection = self.deployments.external_status(&self.project_id).await?;
        let Some(reason) = connection.blocker() else {
            return Ok(());
        };

        info!("External deploy for {} blocked: {reason}", self.project_id);
        let err = OrchestratorError::integration_not_connected(reason);
        let message = err.user_message();
        self.update(|s| s.error = Some(message));
        Err(err)
    }

    async fn poll_until_terminal(&self) -> OrchestratorResult<ExternalDeploymentSnapshot> {
        let mut status_rx = self.status.subscribe();
        let max_attempts = self.config.external_max_poll_attempts;

        for attempt in 1..=max_attempts {
            tokio::select! {
                _ = sleep(self.config.external_poll_interval()) => {}
                _ = wait_for_failure(&mut status_rx) => {}
            }

            if self.status.snapshot().is_failed() {
                self.fail(String::from(
                    "The development environment failed during deployment",
                ));
                return Err(OrchestratorError::provisioning_failed(
                    "environment failed while deploying",
                ));
            }

            let current = match self.deployments.external_deployment(&self.project_id).await {
                Ok(current) => current,
                Err(e) => {
                    debug!("External build poll {attempt} for {} failed: {e}", self.project_id);
                    continue;
                }
            };

            // No longer tracked means the backend saw it through
            if !current.has_deployment {
                self.update(|s| {
                    s.status = Some(BuildStatus::Success);
                    if current.last_deployment_url.is_some() {
                        s.url = current.last_deployment_url.clone();
                    }
                    s.error = None;
                });
                info!("External build for {} finished", self.project_id);
                return Ok(self.snapshot());
            }

            match self.absorb(&current) {
                Some(BuildStatus::Success) => {
                    info!("External build for {} succeeded", self.project_id);
                    return Ok(self.snapshot());
                }
                Some(BuildStatus::Failed) => {
                    let detail = current.logs.last().cloned();
                    return Err(self.failed_build(detail));
                }
                _ => {}
            }
        }

        let waited_secs = self.config.external_poll_interval_secs * u64::from(max_attempts);
        warn!(
            "External build for {} not finished after {waited_secs}s",
            self.project_id
        );
        self.fail(format!("The build did not finish within {waited_secs} seconds"));
        Err(OrchestratorError::timeout("External deployment", max_attempts))
    }

    fn absorb(&self, current: &ExternalDeploymentCurrent) -> Option<BuildStatus> {
        let status = current.build_status();
        self.update(|s| {
            if current.deployment_id.is_some() {
                s.deployment_id = current.deployment_id.clone();
            }
            if current.deployment_url.is_some() {
                s.url = current.deployment_url.clone();
            }
            if !current.logs.is_empty() {
                s.logs = current.logs.clone();
            }
            if status.is_some() {
                s.status = status;
            }
        });
        status
    }

    fn begin(&self) -> OrchestratorResult<()> {
        let started = self.state.send_if_modified(|s| {
            if s.is_building() {
                return false;
            }
            *s = ExternalDeploymentSnapshot {
                status: Some(BuildStatus::Pending),
                ..ExternalDeploymentSnapshot::default()
            };
            true
        });

        if !started {
            return Err(OrchestratorError::deployment_in_flight());
        }
        self.announce();
        Ok(())
    }

    fn failed_build(&self, detail: Option<String>) -> OrchestratorError {
        let message = detail.unwrap_or_else(|| String::from("The build failed"));
        self.fail(message.clone());
        OrchestratorError::deployment_failed(message)
    }

    fn fail(&self, message: String) {
        self.update(|s| {
            s.status = Some(BuildStatus::Failed);
            s.error = Some(message);
        });
    }

    fn update(&self, modify: impl FnOnce(&mut ExternalDeploymentSnapshot)) {
        let changed = self.state.send_if_modified(|s| {
            let before = s.clone();
            modify(s);
            *s != before
        });
        if changed {
            self.announce();
        }
    }

    fn announce(&self) {
        self.events.publish(
            &self.project_id,
            StudioEventKind::ExternalDeploymentChanged(self.snapshot()),
        );
    }
}
