use crate::events::{EventBus, StudioEventKind};
use crate::health_probe::HealthProbe;
use crate::lifecycle::machine::{LifecycleEffect, LifecycleInput, LifecycleMachine, UserAction};
use crate::lifecycle::reconciler::StatusReconciler;
use crate::preview_cache::PreviewCache;
use crate::readiness::ReadinessWaiter;
use crate::status_store::{StatusSnapshot, StatusStore};
use crate::{OrchestratorError, OrchestratorResult};

use studio_client::{ClientError, ErrorLogsResponse, PreviewLogsResponse, ProjectApi};
use studio_config::ReadinessConfig;
use studio_core::{ProjectStatus, ProjectStatusPush};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;

/// Owns a project's status lifecycle.
///
/// Responsibilities:
/// - Merge push events, polls and user actions into one status
/// - Confirm dev-server health after every transition to `active`
/// - Start the preview at most once on its own between explicit stops
///
/// Must be created inside a tokio runtime; the effect executor is a task
/// that lives until [`LifecycleController::shutdown`] or drop.
pub struct LifecycleController {
    project_id: String,
    projects: Arc<dyn ProjectApi>,
    reconciler: Arc<StatusReconciler>,
    waiter: ReadinessWaiter,
    events: EventBus,
    executor: JoinHandle<()>,
}

impl LifecycleController {
    pub fn new(
        project_id: &str,
        projects: Arc<dyn ProjectApi>,
        events: EventBus,
        preview_cache: PreviewCache,
        readiness: ReadinessConfig,
        health_timeout: Duration,
    ) -> Self {
        let (effects_tx, effects_rx) = mpsc::unbounded_channel();
        let machine = LifecycleMachine::new(preview_cache.get(project_id));
        let reconciler = Arc::new(StatusReconciler::new(
            project_id,
            Arc::clone(&projects),
            machine,
            events.clone(),
            effects_tx,
        ));
        let probe = HealthProbe::new(Arc::clone(&projects), health_timeout);
        let waiter = ReadinessWaiter::new(Arc::clone(&reconciler), probe.clone(), readiness.clone());

        let executor = tokio::spawn(run_effects(
            Arc::new(EffectContext {
                reconciler: Arc::clone(&reconciler),
                waiter: waiter.clone(),
                probe,
                projects: Arc::clone(&projects),
                preview_cache,
                readiness,
            }),
            effects_rx,
        ));

        Self {
            project_id: project_id.to_string(),
            projects,
            reconciler,
            waiter,
            events,
            executor,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn store(&self) -> &StatusStore {
        self.reconciler.store()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.reconciler.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.reconciler.store().subscribe()
    }

    pub fn waiter(&self) -> &ReadinessWaiter {
        &self.waiter
    }

    /// Feed any input directly; pushes and user actions normally arrive
    /// through the dedicated methods.
    pub fn apply(&self, input: LifecycleInput) {
        self.reconciler.apply(input);
    }

    pub fn apply_push(&self, push: &ProjectStatusPush) {
        self.reconciler.apply(LifecycleInput::from(push));
    }

    pub fn server_restarted(&self) {
        info!("Backend restarted; re-confirming {}", self.project_id);
        self.reconciler.apply(LifecycleInput::ServerRestarted);
    }

    /// One status poll.
    pub async fn refresh(&self) -> OrchestratorResult<StatusSnapshot> {
        self.reconciler.refresh_status().await
    }

    /// Start the sandbox if needed, start the preview and wait until ready.
    pub async fn start(&self) -> OrchestratorResult<()> {
        let snapshot = self.snapshot();
        if snapshot.is_failed() {
            return Err(OrchestratorError::provisioning_failed(
                "environment is in a failed state; restart it instead",
            ));
        }

        let sandbox_running = snapshot.status == Some(ProjectStatus::Active);
        self.reconciler.apply(LifecycleInput::User(UserAction::Start));

        if !sandbox_running {
            if let Err(e) = self.projects.start_sandbox(&self.project_id).await {
                return Err(self.resync_after(e).await);
            }
        }
        self.start_preview_and_wait().await
    }

    pub async fn stop(&self) -> OrchestratorResult<()> {
        self.reconciler.apply(LifecycleInput::User(UserAction::Stop));
        if let Err(e) = self.projects.stop_preview(&self.project_id).await {
            return Err(self.resync_after(e).await);
        }
        Ok(())
    }

    /// Clear a sticky failure and start from scratch.
    pub async fn restart(&self) -> OrchestratorResult<()> {
        self.reconciler
            .apply(LifecycleInput::User(UserAction::Restart));
        if let Err(e) = self.projects.start_sandbox(&self.project_id).await {
            return Err(self.resync_after(e).await);
        }
        self.start_preview_and_wait().await
    }

    /// Bounce the dev server inside a running sandbox and wait until ready.
    pub async fn restart_preview(&self) -> OrchestratorResult<()> {
        info!("Restarting dev server for {}", self.project_id);
        match self.projects.restart_preview(&self.project_id).await {
            Ok(preview) => {
                self.reconciler
                    .apply(LifecycleInput::PreviewStarted { url: preview.url });
                self.events
                    .publish(&self.project_id, StudioEventKind::PreviewReload);
                self.waiter.wait_until_ready().await
            }
            Err(e) => Err(self.resync_after(e).await),
        }
    }

    /// Tail of the dev-server output.
    pub async fn logs(&self, lines: u32) -> OrchestratorResult<PreviewLogsResponse> {
        Ok(self.projects.preview_logs(&self.project_id, lines.max(1)).await?)
    }

    /// Dev-server stderr since it was started.
    pub async fn error_logs(&self) -> OrchestratorResult<ErrorLogsResponse> {
        Ok(self.projects.error_logs(&self.project_id).await?)
    }

    pub async fn wait_until_ready(&self) -> OrchestratorResult<()> {
        self.waiter.wait_until_ready().await
    }

    /// Force the preview pane to reload and make sure it comes back.
    pub fn reload_preview(&self) {
        self.events
            .publish(&self.project_id, StudioEventKind::PreviewReload);
        self.retrigger_preview();
    }

    /// Kick a readiness wait in the background without awaiting it.
    pub fn retrigger_preview(&self) {
        let waiter = self.waiter.clone();
        let project_id = self.project_id.clone();
        tokio::spawn(async move {
            if let Err(e) = waiter.wait_until_ready().await {
                debug!("Preview retrigger for {project_id} ended: {e}");
            }
        });
    }

    pub fn shutdown(&self) {
        self.executor.abort();
    }

    async fn start_preview_and_wait(&self) -> OrchestratorResult<()> {
        let preview = match self.projects.start_preview(&self.project_id).await {
            Ok(preview) => preview,
            Err(e) => return Err(self.resync_after(e).await),
        };
        self.reconciler
            .apply(LifecycleInput::PreviewStarted { url: preview.url });
        self.waiter.wait_until_ready().await
    }

    /// A user action already moved the local status; put back what the
    /// backend actually reports before surfacing the request error.
    async fn resync_after(&self, err: ClientError) -> OrchestratorError {
        warn!("Lifecycle request for {} failed: {err}", self.project_id);
        if let Err(refresh_err) = self.reconciler.refresh_status().await {
            debug!(
                "Status refresh for {} after a failed request also failed: {refresh_err}",
                self.project_id
            );
        }
        OrchestratorError::from(err)
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.executor.abort();
    }
}

struct EffectContext {
    reconciler: Arc<StatusReconciler>,
    waiter: ReadinessWaiter,
    probe: HealthProbe,
    projects: Arc<dyn ProjectApi>,
    preview_cache: PreviewCache,
    readiness: ReadinessConfig,
}

/// Runs effects in order; long-running ones become child tasks that are
/// aborted together with the executor.
async fn run_effects(
    ctx: Arc<EffectContext>,
    mut effects: mpsc::UnboundedReceiver<LifecycleEffect>,
) {
    let mut tasks = JoinSet::new();

    while let Some(effect) = effects.recv().await {
        while tasks.try_join_next().is_some() {}

        match effect {
            LifecycleEffect::CachePreviewAddress(address) => {
                ctx.preview_cache
                    .insert(ctx.reconciler.project_id(), &address);
            }
            LifecycleEffect::ConfirmHealth { epoch } => {
                let ctx = Arc::clone(&ctx);
                tasks.spawn(async move { ctx.confirm_health(epoch).await });
            }
            LifecycleEffect::TriggerPreviewStart => {
                let ctx = Arc::clone(&ctx);
                tasks.spawn(async move { ctx.start_preview().await });
            }
            LifecycleEffect::RefreshStatus => {
                let ctx = Arc::clone(&ctx);
                tasks.spawn(async move {
                    if let Err(e) = ctx.reconciler.refresh_status().await {
                        debug!(
                            "Status refresh for {} failed: {e}",
                            ctx.reconciler.project_id()
                        );
                    }
                });
            }
        }
    }
}

impl EffectContext {
    /// Bounded inline confirmation after a transition to `active`.
    async fn confirm_health(&self, epoch: u64) {
        let project_id = self.reconciler.project_id();
        let attempts = self.readiness.confirm_attempts;

        for attempt in 1..=attempts {
            if self.reconciler.current_epoch() != epoch {
                return;
            }

            let result = self.probe.probe(project_id).await;
            let ready = result.is_ready();
            self.reconciler
                .apply(LifecycleInput::Health { epoch, result });

            if ready {
                debug!("Health of {project_id} confirmed after {attempt} attempts");
                return;
            }
            if attempt < attempts {
                sleep(self.readiness.confirm_interval()).await;
            }
        }

        if self.reconciler.current_epoch() == epoch {
            info!("Dev server for {project_id} still provisioning after {attempts} checks");
            self.reconciler
                .apply(LifecycleInput::ConfirmationExhausted { epoch });
        }
    }

    /// The automatic preview start.
    async fn start_preview(&self) {
        let project_id = self.reconciler.project_id();

        match self.projects.start_preview(project_id).await {
            Ok(preview) => self
                .reconciler
                .apply(LifecycleInput::PreviewStarted { url: preview.url }),
            Err(e) => warn!("Preview start for {project_id} failed: {e}"),
        }

        match self.waiter.wait_until_ready().await {
            Ok(()) => info!("Preview for {project_id} is ready"),
            Err(e @ OrchestratorError::Timeout { .. }) => {
                warn!("Preview for {project_id} did not come up: {e}");
                let epoch = self.reconciler.current_epoch();
                self.reconciler
                    .apply(LifecycleInput::ConfirmationExhausted { epoch });
            }
            Err(e) => debug!("Preview start for {project_id} ended: {e}"),
        }
    }
}
