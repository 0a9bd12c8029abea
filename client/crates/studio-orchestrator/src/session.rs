use crate::deployment::DeploymentController;
use crate::events::EventBus;
use crate::external_deploy::ExternalDeployController;
use crate::lifecycle::LifecycleController;
use crate::preview_cache::PreviewCache;
use crate::push::PushChannel;
use crate::restore::RestoreCoordinator;
use crate::retry::{RetryPolicy, with_retry};
use crate::OrchestratorResult;

use studio_client::{ApiClient, DeploymentApi, ProjectApi, SnapshotApi};
use studio_config::Config;
use studio_core::PushMessage;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;

const PUSH_BUFFER: usize = 64;

/// The consumed backend interfaces, usually all backed by one [`ApiClient`].
#[derive(Clone)]
pub struct Backend {
    pub projects: Arc<dyn ProjectApi>,
    pub deployments: Arc<dyn DeploymentApi>,
    pub snapshots: Arc<dyn SnapshotApi>,
}

impl Backend {
    pub fn new(
        projects: Arc<dyn ProjectApi>,
        deployments: Arc<dyn DeploymentApi>,
        snapshots: Arc<dyn SnapshotApi>,
    ) -> Self {
        Self {
            projects,
            deployments,
            snapshots,
        }
    }

    pub fn from_client(client: ApiClient) -> Self {
        let client = Arc::new(client);
        Self {
            projects: Arc::clone(&client) as Arc<dyn ProjectApi>,
            deployments: Arc::clone(&client) as Arc<dyn DeploymentApi>,
            snapshots: client,
        }
    }
}

/// Every controller of one open project.
///
/// Created when the project is loaded and torn down when it is closed;
/// nothing here outlives the session.
pub struct ProjectSession {
    project_id: String,
    lifecycle: Arc<LifecycleController>,
    deployment: DeploymentController,
    external: ExternalDeployController,
    restore: RestoreCoordinator,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ProjectSession {
    /// Must be called inside a tokio runtime.
    pub fn new(
        project_id: &str,
        backend: &Backend,
        config: &Config,
        events: EventBus,
        preview_cache: PreviewCache,
    ) -> Self {
        let lifecycle = Arc::new(LifecycleController::new(
            project_id,
            Arc::clone(&backend.projects),
            events.clone(),
            preview_cache,
            config.readiness.clone(),
            config.api.health_timeout(),
        ));
        let deployment = DeploymentController::new(
            project_id,
            Arc::clone(&backend.deployments),
            lifecycle.store().clone(),
            events.clone(),
            config.deployment.clone(),
        );
        let external = ExternalDeployController::new(
            project_id,
            Arc::clone(&backend.deployments),
            lifecycle.store().clone(),
            events.clone(),
            config.deployment.clone(),
        );
        let restore = RestoreCoordinator::new(
            project_id,
            Arc::clone(&backend.snapshots),
            Arc::clone(&lifecycle),
            events,
        );

        Self {
            project_id: project_id.to_string(),
            lifecycle,
            deployment,
            external,
            restore,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleController> {
        &self.lifecycle
    }

    pub fn deployment(&self) -> &DeploymentController {
        &self.deployment
    }

    pub fn external(&self) -> &ExternalDeployController {
        &self.external
    }

    pub fn restore(&self) -> &RestoreCoordinator {
        &self.restore
    }

    /// Route one push message to the controller that owns it.
    pub fn dispatch(&self, message: &PushMessage) {
        if !message.is_for(&self.project_id) {
            return;
        }

        match message {
            PushMessage::ProjectStatus(push) => self.lifecycle.apply_push(push),
            PushMessage::DeploymentStatus(push) => self.deployment.apply_push(push),
            PushMessage::Restore(push) => self.restore.handle_restore_push(push),
            PushMessage::SnapshotDiff(push) => self.restore.handle_snapshot_diff(push),
            PushMessage::ServerRestart(_) => self.lifecycle.server_restarted(),
        }
    }

    /// Subscribe to the push stream at `push_url` for this project.
    pub fn attach_push(self: &Arc<Self>, push_url: &str, policy: RetryPolicy) {
        let (tx, rx) = mpsc::channel(PUSH_BUFFER);
        let channel = PushChannel::new(push_url, &self.project_id, policy);
        info!("Subscribing {} to {}", self.project_id, channel.endpoint());

        let reader = channel.spawn(tx);
        let forwarder = self.forward(rx);
        self.track(reader);
        self.track(forwarder);
    }

    /// Dispatch everything arriving on `rx` until it closes or the session
    /// goes away.
    pub fn forward(self: &Arc<Self>, mut rx: mpsc::Receiver<PushMessage>) -> JoinHandle<()> {
        let session = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let Some(session) = session.upgrade() else {
                    break;
                };
                session.dispatch(&message);
            }
        })
    }

    pub fn shutdown(&self) {
        for task in self.lock_tasks().drain(..) {
            task.abort();
        }
        self.lifecycle.shutdown();
        debug!("Session for {} shut down", self.project_id);
    }

    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.lock_tasks();
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ProjectSession {
    fn drop(&mut self) {
        for task in self.lock_tasks().drain(..) {
            task.abort();
        }
    }
}

/// Registry of open project sessions sharing one event bus and one preview
/// cache.
#[derive(Clone)]
pub struct Workspace {
    backend: Backend,
    config: Arc<Config>,
    events: EventBus,
    preview_cache: PreviewCache,
    sessions: Arc<RwLock<HashMap<String, Arc<ProjectSession>>>>,
}

impl Workspace {
    pub fn new(backend: Backend, config: Config) -> Self {
        Self {
            backend,
            events: EventBus::new(config.events.channel_capacity),
            config: Arc::new(config),
            preview_cache: PreviewCache::new(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn preview_cache(&self) -> &PreviewCache {
        &self.preview_cache
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open (or return the already open) session for `project_id`.
    ///
    /// The first status fetch is retried on transient failures; if it still
    /// fails the session is discarded.
    pub async fn open(&self, project_id: &str) -> OrchestratorResult<Arc<ProjectSession>> {
        if let Some(existing) = self.session(project_id).await {
            return Ok(existing);
        }

        let session = Arc::new(ProjectSession::new(
            project_id,
            &self.backend,
            &self.config,
            self.events.clone(),
            self.preview_cache.clone(),
        ));

        let lifecycle = Arc::clone(session.lifecycle());
        let loaded = with_retry(&RetryPolicy::default(), "Initial status fetch", || {
            let lifecycle = Arc::clone(&lifecycle);
            async move { lifecycle.refresh().await }
        })
        .await;
        if let Err(e) = loaded {
            session.shutdown();
            return Err(e);
        }

        if let Err(e) = session.deployment().refresh().await {
            debug!("Deployment state for {project_id} unavailable: {e}");
        }

        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(project_id) {
            session.shutdown();
            return Ok(Arc::clone(existing));
        }

        if self.config.push.enabled {
            session.attach_push(
                &self.config.push_url(),
                RetryPolicy::from(&self.config.push.retry),
            );
        }

        sessions.insert(project_id.to_string(), Arc::clone(&session));
        info!("Opened {project_id} ({} open)", sessions.len());
        Ok(session)
    }

    pub async fn session(&self, project_id: &str) -> Option<Arc<ProjectSession>> {
        self.sessions.read().await.get(project_id).cloned()
    }

    /// Returns whether a session was open.
    pub async fn close(&self, project_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(project_id);
        match removed {
            Some(session) => {
                session.shutdown();
                info!("Closed {project_id}");
                true
            }
            None => false,
        }
    }

    pub async fn close_all(&self) {
        let drained: Vec<_> = self.sessions.write().await.drain().collect();
        for (_, session) in drained {
            session.shutdown();
        }
    }

    pub async fn open_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
