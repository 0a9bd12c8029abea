//! Single-flight wait for a project's preview to become usable.

use crate::health_probe::HealthProbe;
use crate::lifecycle::{LifecycleInput, StatusReconciler};
use crate::status_store::{StatusSnapshot, wait_for_failure};
use crate::{OrchestratorError, OrchestratorResult};

use studio_config::ReadinessConfig;
use studio_core::{NoticeLevel, ProjectStatus};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use log::{debug, info, warn};
use tokio::time::sleep;

/// Why a readiness wait ended without a usable preview.
///
/// Cloned to every caller sharing the wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitFailure {
    Timeout { attempts: u32 },
    ProvisioningFailed { message: String },
    /// The polling task panicked or was cancelled
    TaskAborted,
}

impl WaitFailure {
    #[track_caller]
    pub fn into_error(self) -> OrchestratorError {
        match self {
            WaitFailure::Timeout { attempts } => {
                OrchestratorError::timeout("Preview startup", attempts)
            }
            WaitFailure::ProvisioningFailed { message } => {
                OrchestratorError::provisioning_failed(message)
            }
            WaitFailure::TaskAborted => {
                OrchestratorError::provisioning_failed("readiness wait was interrupted")
            }
        }
    }
}

type SharedWait = Shared<BoxFuture<'static, Result<(), WaitFailure>>>;

struct InFlightWait {
    generation: u64,
    wait: SharedWait,
}

/// Waits until `PreviewReady` holds, sharing one polling task between all
/// concurrent callers of the same project.
#[derive(Clone)]
pub struct ReadinessWaiter {
    inner: Arc<WaiterInner>,
}

struct WaiterInner {
    reconciler: Arc<StatusReconciler>,
    probe: HealthProbe,
    config: ReadinessConfig,
    in_flight: Mutex<Option<InFlightWait>>,
    waits_started: AtomicU64,
}

impl ReadinessWaiter {
    pub fn new(
        reconciler: Arc<StatusReconciler>,
        probe: HealthProbe,
        config: ReadinessConfig,
    ) -> Self {
        Self {
            inner: Arc::new(WaiterInner {
                reconciler,
                probe,
                config,
                in_flight: Mutex::new(None),
                waits_started: AtomicU64::new(0),
            }),
        }
    }

    /// Resolve once the preview is ready.
    ///
    /// Returns immediately when the cached snapshot is already ready. Joins
    /// the in-flight wait if there is one; a finished wait is never reused.
    pub async fn wait_until_ready(&self) -> OrchestratorResult<()> {
        if self.inner.reconciler.snapshot().is_preview_ready() {
            return Ok(());
        }

        let (generation, wait) = self.join_or_start();
        let outcome = wait.await;
        self.clear_if_current(generation);

        outcome.map_err(WaitFailure::into_error)
    }

    /// A wait is currently polling.
    pub fn is_waiting(&self) -> bool {
        self.lock_slot()
            .as_ref()
            .is_some_and(|in_flight| in_flight.wait.peek().is_none())
    }

    /// Number of polling tasks started so far.
    pub fn waits_started(&self) -> u64 {
        self.inner.waits_started.load(Ordering::SeqCst)
    }

    fn join_or_start(&self) -> (u64, SharedWait) {
        let mut slot = self.lock_slot();

        if let Some(in_flight) = slot.as_ref()
            && in_flight.wait.peek().is_none()
        {
            return (in_flight.generation, in_flight.wait.clone());
        }

        let generation = self.inner.waits_started.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.poll_until_ready().await });
        let wait = async move {
            handle.await.unwrap_or_else(|e| {
                warn!("Readiness wait task ended abnormally: {e}");
                Err(WaitFailure::TaskAborted)
            })
        }
        .boxed()
        .shared();

        *slot = Some(InFlightWait {
            generation,
            wait: wait.clone(),
        });

        (generation, wait)
    }

    fn clear_if_current(&self, generation: u64) {
        let mut slot = self.lock_slot();
        if slot
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            *slot = None;
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<InFlightWait>> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl WaiterInner {
    async fn poll_until_ready(&self) -> Result<(), WaitFailure> {
        let project_id = self.reconciler.project_id();
        let mut status_rx = self.reconciler.store().subscribe();

        if let Err(e) = self.reconciler.refresh_status().await {
            debug!("Initial status refresh for {project_id} failed: {e}");
        }

        let mut attempts = 0;
        loop {
            let snapshot = self.reconciler.snapshot();
            if snapshot.is_preview_ready() {
                return Ok(());
            }
            if snapshot.is_failed() {
                return Err(provisioning_failure(&snapshot));
            }
            if attempts >= self.config.max_attempts {
                warn!("Preview for {project_id} not ready after {attempts} attempts");
                return Err(WaitFailure::Timeout { attempts });
            }
            attempts += 1;

            if snapshot.status == Some(ProjectStatus::Active) {
                let epoch = self.reconciler.current_epoch();
                let result = self.probe.probe(project_id).await;
                self.reconciler
                    .apply(LifecycleInput::Health { epoch, result });

                if self.reconciler.snapshot().is_preview_ready() {
                    info!("Preview for {project_id} ready after {attempts} attempts");
                    return Ok(());
                }
            }

            tokio::select! {
                _ = sleep(self.config.interval()) => {}
                _ = wait_for_failure(&mut status_rx) => {}
            }

            if attempts % self.config.status_refresh_every.max(1) == 0
                && let Err(e) = self.reconciler.refresh_status().await
            {
                debug!("Status refresh for {project_id} failed: {e}");
            }
        }
    }
}

fn provisioning_failure(snapshot: &StatusSnapshot) -> WaitFailure {
    let message = snapshot
        .notice
        .as_ref()
        .filter(|notice| notice.level == NoticeLevel::Error)
        .map(|notice| notice.message.clone())
        .unwrap_or_else(|| String::from("project status is failed"));

    WaitFailure::ProvisioningFailed { message }
}
