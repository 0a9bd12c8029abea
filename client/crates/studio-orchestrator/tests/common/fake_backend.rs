#![allow(dead_code)]

use studio_client::{
    ClientError, ClientResult, CommitInfo, DeployRequest, DeploymentApi,
    DeploymentStatusResponse, ErrorLogsResponse, ExternalConnectionStatus, ExternalDeployResponse,
    ExternalDeploymentCurrent, HealthPayload, PreviewLogsResponse, PreviewStartResponse,
    ProjectApi, ProjectInfo, RestoreConfirmRequest, SnapshotApi,
    SubdomainAvailability, UnpublishRequest,
};
use studio_config::Config;
use studio_core::{DevServerHealthState, ProjectStatus};
use studio_orchestrator::Backend;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

pub const PROJECT_ID: &str = "proj-1";

/// Holds the next `get_project` call until released.
pub struct PollGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// In-memory backend. Every knob is a plain field behind a mutex so tests
/// can change answers between calls.
pub struct FakeBackend {
    pub project: Mutex<ProjectInfo>,
    pub project_failures: AtomicUsize,
    pub poll_gate: Mutex<Option<PollGate>>,
    pub health: Mutex<Option<HealthPayload>>,
    pub preview_url: Mutex<Option<String>>,
    pub start_sandbox_fails: Mutex<bool>,
    pub stop_preview_fails: Mutex<bool>,
    pub dev_server_logs: Mutex<Vec<String>>,
    pub dev_server_running: Mutex<bool>,
    pub error_output: Mutex<String>,

    pub subdomain_available: Mutex<bool>,
    pub deployment_statuses: Mutex<VecDeque<DeploymentStatusResponse>>,
    pub deployment_default: Mutex<DeploymentStatusResponse>,
    pub deploy_requests: Mutex<Vec<DeployRequest>>,
    pub unpublish_requests: Mutex<Vec<UnpublishRequest>>,

    pub external_response: Mutex<ExternalDeployResponse>,
    pub external_currents: Mutex<VecDeque<ExternalDeploymentCurrent>>,
    pub external_default: Mutex<ExternalDeploymentCurrent>,
    pub external_connection: Mutex<ExternalConnectionStatus>,
    pub external_deploy_calls: AtomicUsize,

    pub commits: Mutex<Vec<CommitInfo>>,
    pub restore_temp_calls: Mutex<Vec<(String, bool)>>,
    pub restore_temp_fails: Mutex<bool>,
    pub confirm_requests: Mutex<Vec<RestoreConfirmRequest>>,
    pub cancel_supported: Mutex<bool>,
    pub confirm_fails: Mutex<bool>,
    pub cancel_fails: Mutex<bool>,

    pub get_project_calls: AtomicUsize,
    pub health_calls: AtomicUsize,
    pub start_sandbox_calls: AtomicUsize,
    pub start_preview_calls: AtomicUsize,
    pub stop_preview_calls: AtomicUsize,
    pub restart_preview_calls: AtomicUsize,
    pub check_subdomain_calls: AtomicUsize,
    pub deployment_status_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(status: ProjectStatus) -> Arc<Self> {
        Arc::new(Self {
            project: Mutex::new(project(status, None)),
            project_failures: AtomicUsize::new(0),
            poll_gate: Mutex::new(None),
            health: Mutex::new(None),
            preview_url: Mutex::new(None),
            start_sandbox_fails: Mutex::new(false),
            stop_preview_fails: Mutex::new(false),
            dev_server_logs: Mutex::new(Vec::new()),
            dev_server_running: Mutex::new(false),
            error_output: Mutex::new(String::new()),
            subdomain_available: Mutex::new(true),
            deployment_statuses: Mutex::new(VecDeque::new()),
            deployment_default: Mutex::new(DeploymentStatusResponse {
                status: Some(String::from("building")),
                ..DeploymentStatusResponse::default()
            }),
            deploy_requests: Mutex::new(Vec::new()),
            unpublish_requests: Mutex::new(Vec::new()),
            external_response: Mutex::new(ExternalDeployResponse {
                deployment_id: String::from("dpl_1"),
                deployment_url: Some(String::from("https://proj-1.vercel.app")),
                status: Some(String::from("QUEUED")),
            }),
            external_currents: Mutex::new(VecDeque::new()),
            external_default: Mutex::new(ExternalDeploymentCurrent {
                has_deployment: true,
                status: Some(String::from("BUILDING")),
                ..ExternalDeploymentCurrent::default()
            }),
            external_connection: Mutex::new(ExternalConnectionStatus {
                connected: true,
                status: Some(String::from("active")),
                token_exists: true,
                project_connected: true,
            }),
            external_deploy_calls: AtomicUsize::new(0),
            commits: Mutex::new(vec![commit("head-0")]),
            restore_temp_calls: Mutex::new(Vec::new()),
            restore_temp_fails: Mutex::new(false),
            confirm_requests: Mutex::new(Vec::new()),
            cancel_supported: Mutex::new(true),
            confirm_fails: Mutex::new(false),
            cancel_fails: Mutex::new(false),
            get_project_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            start_sandbox_calls: AtomicUsize::new(0),
            start_preview_calls: AtomicUsize::new(0),
            stop_preview_calls: AtomicUsize::new(0),
            restart_preview_calls: AtomicUsize::new(0),
            check_subdomain_calls: AtomicUsize::new(0),
            deployment_status_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        })
    }

    pub fn backend(self: &Arc<Self>) -> Backend {
        Backend::new(
            Arc::clone(self) as Arc<dyn ProjectApi>,
            Arc::clone(self) as Arc<dyn DeploymentApi>,
            Arc::clone(self) as Arc<dyn SnapshotApi>,
        )
    }

    pub fn set_project(&self, status: ProjectStatus, preview_url: Option<&str>) {
        *lock(&self.project) = project(status, preview_url);
    }

    pub fn set_health(&self, state: DevServerHealthState) {
        *lock(&self.health) = Some(HealthPayload {
            state,
            latency_ms: Some(3),
            http_status: Some(200),
            message: None,
        });
    }

    /// The next `get_project` waits for `release` after signalling `entered`.
    pub fn hold_next_poll(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *lock(&self.poll_gate) = Some(PollGate {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });
        (entered, release)
    }

    pub fn script_deployment(&self, status: &str) {
        lock(&self.deployment_statuses).push_back(DeploymentStatusResponse {
            status: Some(status.to_string()),
            subdomain_name: Some(String::from("my-app")),
            url: Some(String::from("https://my-app.studio.app")),
            ..DeploymentStatusResponse::default()
        });
    }

    /// Flip a boolean knob.
    pub fn set(flag: &Mutex<bool>, value: bool) {
        *lock(flag) = value;
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub fn project(status: ProjectStatus, preview_url: Option<&str>) -> ProjectInfo {
    ProjectInfo {
        id: Some(PROJECT_ID.to_string()),
        name: Some(String::from("Demo")),
        status,
        preview_url: preview_url.map(String::from),
        dev_server_url: None,
    }
}

pub fn commit(id: &str) -> CommitInfo {
    CommitInfo {
        id: id.to_string(),
        message: None,
        created_at: None,
    }
}

/// Defaults with push disabled.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.push.enabled = false;
    config
}

pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("fake backend mutex poisoned")
}

fn unavailable() -> ClientError {
    ClientError::api_error(503, "UNAVAILABLE", "backend unavailable")
}

#[async_trait]
impl ProjectApi for FakeBackend {
    async fn get_project(&self, _project_id: &str) -> ClientResult<ProjectInfo> {
        self.get_project_calls.fetch_add(1, Ordering::SeqCst);

        let gate = lock(&self.poll_gate).take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self
            .project_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(unavailable());
        }
        Ok(lock(&self.project).clone())
    }

    async fn dev_server_health(&self, _project_id: &str) -> ClientResult<Option<HealthPayload>> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.health).clone())
    }

    async fn start_sandbox(&self, _project_id: &str) -> ClientResult<()> {
        self.start_sandbox_calls.fetch_add(1, Ordering::SeqCst);
        if *lock(&self.start_sandbox_fails) {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn start_preview(&self, _project_id: &str) -> ClientResult<PreviewStartResponse> {
        self.start_preview_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PreviewStartResponse {
            url: lock(&self.preview_url).clone(),
        })
    }

    async fn stop_preview(&self, _project_id: &str) -> ClientResult<()> {
        self.stop_preview_calls.fetch_add(1, Ordering::SeqCst);
        if *lock(&self.stop_preview_fails) {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn restart_preview(&self, _project_id: &str) -> ClientResult<PreviewStartResponse> {
        self.restart_preview_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PreviewStartResponse {
            url: lock(&self.preview_url).clone(),
        })
    }

    async fn preview_logs(&self, _project_id: &str, lines: u32) -> ClientResult<PreviewLogsResponse> {
        let logs = lock(&self.dev_server_logs);
        let skip = logs.len().saturating_sub(lines as usize);
        Ok(PreviewLogsResponse {
            logs: logs[skip..].join("\n"),
            running: *lock(&self.dev_server_running),
        })
    }

    async fn error_logs(&self, project_id: &str) -> ClientResult<ErrorLogsResponse> {
        Ok(ErrorLogsResponse {
            logs: lock(&self.error_output).clone(),
            project_id: Some(project_id.to_string()),
        })
    }
}

#[async_trait]
impl DeploymentApi for FakeBackend {
    async fn check_subdomain(&self, _subdomain: &str) -> ClientResult<SubdomainAvailability> {
        self.check_subdomain_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SubdomainAvailability {
            available: *lock(&self.subdomain_available),
        })
    }

    async fn deploy(&self, _project_id: &str, request: &DeployRequest) -> ClientResult<()> {
        lock(&self.deploy_requests).push(request.clone());
        Ok(())
    }

    async fn deployment_status(&self, _project_id: &str) -> ClientResult<DeploymentStatusResponse> {
        self.deployment_status_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = lock(&self.deployment_statuses).pop_front();
        Ok(scripted.unwrap_or_else(|| lock(&self.deployment_default).clone()))
    }

    async fn unpublish(&self, _project_id: &str, request: &UnpublishRequest) -> ClientResult<()> {
        lock(&self.unpublish_requests).push(request.clone());
        Ok(())
    }

    async fn external_deploy(
        &self,
        _project_id: &str,
        _branch: Option<&str>,
    ) -> ClientResult<ExternalDeployResponse> {
        self.external_deploy_calls.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.external_response).clone())
    }

    async fn external_deployment(
        &self,
        _project_id: &str,
    ) -> ClientResult<ExternalDeploymentCurrent> {
        let scripted = lock(&self.external_currents).pop_front();
        Ok(scripted.unwrap_or_else(|| lock(&self.external_default).clone()))
    }

    async fn external_status(&self, _project_id: &str) -> ClientResult<ExternalConnectionStatus> {
        Ok(lock(&self.external_connection).clone())
    }
}

#[async_trait]
impl SnapshotApi for FakeBackend {
    async fn commits(&self, _project_id: &str, limit: u32) -> ClientResult<Vec<CommitInfo>> {
        Ok(lock(&self.commits)
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn restore_temp(
        &self,
        _project_id: &str,
        snapshot_id: &str,
        temporary: bool,
    ) -> ClientResult<()> {
        if *lock(&self.restore_temp_fails) {
            return Err(unavailable());
        }
        lock(&self.restore_temp_calls).push((snapshot_id.to_string(), temporary));
        if !temporary {
            lock(&self.commits).insert(0, commit(snapshot_id));
        }
        Ok(())
    }

    async fn restore_confirm(
        &self,
        _project_id: &str,
        request: &RestoreConfirmRequest,
    ) -> ClientResult<()> {
        if *lock(&self.confirm_fails) {
            return Err(unavailable());
        }
        lock(&self.confirm_requests).push(request.clone());
        lock(&self.commits).insert(0, commit(&request.snapshot_id));
        Ok(())
    }

    async fn restore_cancel(&self, _project_id: &str) -> ClientResult<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if *lock(&self.cancel_fails) {
            return Err(unavailable());
        }
        if !*lock(&self.cancel_supported) {
            return Err(ClientError::api_error(404, "NOT_FOUND", "Not Found"));
        }
        Ok(())
    }
}
