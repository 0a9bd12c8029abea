//! Publish, update and unpublish of a project's public subdomain.

use crate::deployment::subdomain::{normalize_subdomain, public_address};
use crate::events::{EventBus, StudioEventKind};
use crate::status_store::{StatusStore, wait_for_failure};
use crate::{OrchestratorError, OrchestratorResult};

use studio_client::{DeployRequest, DeploymentApi, UnpublishRequest};
use studio_config::DeploymentConfig;
use studio_core::{BuildStatus, DeploymentPush, DeploymentState};

use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DeploymentSnapshot {
    pub state: DeploymentState,
    /// Subdomain currently (or last) deployed
    pub subdomain: Option<String>,
    pub url: Option<String>,
    /// Last failure; kept until the next action
    pub error: Option<String>,
    pub custom_domains: Vec<String>,
    pub build_status: Option<BuildStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpublishTarget {
    /// Take down the primary subdomain; custom domains stay attached
    Subdomain,
    /// Detach a single custom domain; the subdomain stays live
    CustomDomain(String),
}

pub struct DeploymentController {
    project_id: String,
    deployments: Arc<dyn DeploymentApi>,
    status: StatusStore,
    events: EventBus,
    config: DeploymentConfig,
    state: watch::Sender<DeploymentSnapshot>,
}

impl DeploymentController {
    pub fn new(
        project_id: &str,
        deployments: Arc<dyn DeploymentApi>,
        status: StatusStore,
        events: EventBus,
        config: DeploymentConfig,
    ) -> Self {
        let (state, _) = watch::channel(DeploymentSnapshot::default());
        Self {
            project_id: project_id.to_string(),
            deployments,
            status,
            events,
            config,
            state,
        }
    }

    pub fn snapshot(&self) -> DeploymentSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeploymentSnapshot> {
        self.state.subscribe()
    }

    /// Publish (or update) the project at `<subdomain>.<suffix>` and poll
    /// until the build reaches a terminal state.
    pub async fn publish(
        &self,
        subdomain: &str,
        custom_domain_id: Option<&str>,
    ) -> OrchestratorResult<DeploymentSnapshot> {
        let name = normalize_subdomain(subdomain)?;
        let previous = self.begin(DeploymentState::Deploying)?;

        let deployed = match previous.state {
            DeploymentState::Live => previous.subdomain.as_deref(),
            _ => None,
        };

        if deployed != Some(name.as_str()) {
            match self.deployments.check_subdomain(&name).await {
                Ok(availability) if availability.available => {}
                Ok(_) => {
                    let address = public_address(&name, &self.config.subdomain_suffix);
                    info!("Subdomain {address} is taken; not deploying");
                    self.revert(&previous, format!("{address} is already taken"));
                    return Err(OrchestratorError::name_conflict(address));
                }
                Err(e) => {
                    let err = OrchestratorError::from(e);
                    self.revert(&previous, err.user_message());
                    return Err(err);
                }
            }
        }

        let request = DeployRequest {
            subdomain_name: name.clone(),
            custom_domain_id: custom_domain_id.map(String::from),
        };
        if let Err(e) = self.deployments.deploy(&self.project_id, &request).await {
            let err = OrchestratorError::from(e);
            self.fail(err.user_message());
            return Err(err);
        }

        info!("Deployment of {} to {name} started", self.project_id);
        self.poll_until_terminal(&name).await
    }

    pub async fn unpublish(&self, target: UnpublishTarget) -> OrchestratorResult<DeploymentSnapshot> {
        match target {
            UnpublishTarget::Subdomain => {
                let previous = self.begin(DeploymentState::Removing)?;
                match self
                    .deployments
                    .unpublish(&self.project_id, &UnpublishRequest::subdomain())
                    .await
                {
                    Ok(()) => {
                        self.update(|s| {
                            s.state = DeploymentState::Idle;
                            s.subdomain = None;
                            s.url = None;
                            s.build_status = None;
                            s.error = None;
                        });
                        info!("Unpublished {}", self.project_id);
                        Ok(self.snapshot())
                    }
                    Err(e) => {
                        let err = OrchestratorError::from(e);
                        self.revert(&previous, err.user_message());
                        Err(err)
                    }
                }
            }
            UnpublishTarget::CustomDomain(domain_id) => {
                if self.snapshot().state.is_busy() {
                    return Err(OrchestratorError::deployment_in_flight());
                }
                let request = UnpublishRequest::custom_domain(domain_id.clone());
                match self.deployments.unpublish(&self.project_id, &request).await {
                    Ok(()) => {
                        self.update(|s| {
                            s.custom_domains.retain(|d| *d != domain_id);
                            s.error = None;
                        });
                        Ok(self.snapshot())
                    }
                    Err(e) => {
                        let err = OrchestratorError::from(e);
                        let message = err.user_message();
                        self.update(|s| s.error = Some(message));
                        Err(err)
                    }
                }
            }
        }
    }

    /// Hydrate from the backend. Leaves an in-flight publish or removal alone.
    pub async fn refresh(&self) -> OrchestratorResult<DeploymentSnapshot> {
        if self.snapshot().state.is_busy() {
            return Ok(self.snapshot());
        }

        let response = self.deployments.deployment_status(&self.project_id).await?;
        let build_status = response.build_status();

        self.update(|s| {
            if s.state.is_busy() {
                return;
            }
            s.build_status = build_status;
            match build_status {
                Some(BuildStatus::Success) => {
                    s.state = DeploymentState::Live;
                    s.subdomain = response.subdomain_name.clone();
                    s.url = response.url.clone();
                    s.custom_domains = response.custom_domains.clone();
                }
                Some(BuildStatus::Failed) => {
                    s.state = DeploymentState::Error;
                    s.error = response.error.clone();
                }
                Some(BuildStatus::Pending | BuildStatus::Building) => {}
                None if response.subdomain_name.is_none() => {
                    s.state = DeploymentState::Idle;
                    s.subdomain = None;
                    s.url = None;
                }
                None => {}
            }
        });

        Ok(self.snapshot())
    }

    /// Pushed deployment status. A terminal status wakes a running poll loop.
    pub fn apply_push(&self, push: &DeploymentPush) {
        self.update(|s| match push.status {
            BuildStatus::Success if s.state != DeploymentState::Removing => {
                s.state = DeploymentState::Live;
                s.build_status = Some(BuildStatus::Success);
                s.error = None;
                if push.subdomain_name.is_some() {
                    s.subdomain = push.subdomain_name.clone();
                }
                if push.url.is_some() {
                    s.url = push.url.clone();
                }
            }
            BuildStatus::Failed if s.state == DeploymentState::Deploying => {
                s.state = DeploymentState::Error;
                s.build_status = Some(BuildStatus::Failed);
                s.error = Some(
                    push.error
                        .clone()
                        .unwrap_or_else(|| String::from("The build failed")),
                );
            }
            status @ (BuildStatus::Pending | BuildStatus::Building)
                if s.state == DeploymentState::Deploying =>
            {
                s.build_status = Some(status);
            }
            _ => {}
        });
    }

    async fn poll_until_terminal(&self, name: &str) -> OrchestratorResult<DeploymentSnapshot> {
        let mut status_rx = self.status.subscribe();
        let mut state_rx = self.state.subscribe();
        let max_attempts = self.config.max_poll_attempts;

        for attempt in 1..=max_attempts {
            tokio::select! {
                _ = sleep(self.config.poll_interval()) => {}
                _ = wait_for_failure(&mut status_rx) => {}
                _ = wait_for_terminal(&mut state_rx) => {}
            }

            if self.status.snapshot().is_failed() {
                warn!("Project {} failed during deployment", self.project_id);
                self.fail(String::from(
                    "The development environment failed during deployment",
                ));
                return Err(OrchestratorError::provisioning_failed(
                    "environment failed while deploying",
                ));
            }

            let current = self.snapshot();
            match current.state {
                DeploymentState::Live => return Ok(current),
                DeploymentState::Error => {
                    return Err(OrchestratorError::deployment_failed(
                        current.error.unwrap_or_default(),
                    ));
                }
                _ => {}
            }

            let response = match self.deployments.deployment_status(&self.project_id).await {
                Ok(response) => response,
                Err(e) => {
                    debug!("Deployment poll {attempt} for {} failed: {e}", self.project_id);
                    continue;
                }
            };

            match response.build_status() {
                Some(BuildStatus::Success) => {
                    self.update(|s| {
                        s.state = DeploymentState::Live;
                        s.subdomain = response
                            .subdomain_name
                            .clone()
                            .or_else(|| Some(name.to_string()));
                        s.url = response.url.clone();
                        s.error = None;
                        s.build_status = Some(BuildStatus::Success);
                        if !response.custom_domains.is_empty() {
                            s.custom_domains = response.custom_domains.clone();
                        }
                    });
                    info!("Deployment of {} is live", self.project_id);
                    return Ok(self.snapshot());
                }
                Some(BuildStatus::Failed) => {
                    let message = response
                        .error
                        .clone()
                        .unwrap_or_else(|| String::from("The build failed"));
                    self.fail(message.clone());
                    return Err(OrchestratorError::deployment_failed(message));
                }
                other => self.update(|s| s.build_status = other),
            }
        }

        let waited_secs = self.config.poll_interval_secs * u64::from(max_attempts);
        warn!(
            "Deployment of {} still not finished after {waited_secs}s",
            self.project_id
        );
        self.fail(format!(
            "Deployment did not finish within {waited_secs} seconds. Check again later."
        ));
        Err(OrchestratorError::timeout("Deployment", max_attempts))
    }

    /// Atomically move to `next` unless a publish or removal is outstanding.
    /// Returns the snapshot from before the move.
    fn begin(&self, next: DeploymentState) -> OrchestratorResult<DeploymentSnapshot> {
        let mut previous = None;
        self.state.send_if_modified(|s| {
            if s.state.is_busy() {
                return false;
            }
            previous = Some(s.clone());
            s.state = next;
            s.error = None;
            s.build_status = None;
            true
        });

        let previous = previous.ok_or_else(OrchestratorError::deployment_in_flight)?;
        self.announce();
        Ok(previous)
    }

    fn revert(&self, previous: &DeploymentSnapshot, message: String) {
        self.update(|s| {
            s.state = previous.state;
            s.build_status = previous.build_status;
            s.error = Some(message);
        });
    }

    fn fail(&self, message: String) {
        self.update(|s| {
            s.state = DeploymentState::Error;
            s.error = Some(message);
        });
    }

    fn update(&self, modify: impl FnOnce(&mut DeploymentSnapshot)) {
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
            StudioEventKind::DeploymentChanged(self.snapshot()),
        );
    }
}

async fn wait_for_terminal(receiver: &mut watch::Receiver<DeploymentSnapshot>) {
    loop {
        if matches!(
            receiver.borrow_and_update().state,
            DeploymentState::Live | DeploymentState::Error
        ) {
            return;
        }
        if receiver.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
