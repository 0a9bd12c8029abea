use crate::events::{EventBus, StudioEventKind};
use crate::lifecycle::machine::{LifecycleEffect, LifecycleInput, LifecycleMachine};
use crate::status_store::{StatusSnapshot, StatusStore};
use crate::OrchestratorResult;

use studio_client::ProjectApi;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use tokio::sync::mpsc;

/// Single writer of a project's [`StatusStore`].
///
/// Feeds inputs through the [`LifecycleMachine`], publishes the resulting
/// snapshot and events, and hands effects to the controller's executor. The
/// machine lock is never held across an await.
pub struct StatusReconciler {
    project_id: String,
    projects: Arc<dyn ProjectApi>,
    store: StatusStore,
    machine: Mutex<LifecycleMachine>,
    events: EventBus,
    effects: mpsc::UnboundedSender<LifecycleEffect>,
}

impl StatusReconciler {
    pub(crate) fn new(
        project_id: &str,
        projects: Arc<dyn ProjectApi>,
        machine: LifecycleMachine,
        events: EventBus,
        effects: mpsc::UnboundedSender<LifecycleEffect>,
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            projects,
            store: StatusStore::new(machine.snapshot().clone()),
            machine: Mutex::new(machine),
            events,
            effects,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.store.snapshot()
    }

    pub fn current_epoch(&self) -> u64 {
        self.lock_machine().epoch()
    }

    pub fn apply(&self, input: LifecycleInput) {
        let mut machine = self.lock_machine();
        let previous = machine.snapshot().clone();
        let effects = machine.apply(input);
        let next = machine.snapshot().clone();

        // Published under the lock so concurrent inputs cannot reorder
        if self.store.publish(next.clone()) {
            self.announce(&previous, &next);
        }

        for effect in effects {
            if self.effects.send(effect).is_err() {
                debug!("Effect executor for {} has stopped", self.project_id);
            }
        }
    }

    /// Pull the project once and apply it as a poll.
    pub async fn refresh_status(&self) -> OrchestratorResult<StatusSnapshot> {
        let ticket = self.lock_machine().poll_ticket();
        let info = self.projects.get_project(&self.project_id).await?;
        self.apply(LifecycleInput::Poll { ticket, info });
        Ok(self.snapshot())
    }

    fn announce(&self, previous: &StatusSnapshot, next: &StatusSnapshot) {
        if previous.status != next.status {
            info!(
                "Project {} status {} -> {}",
                self.project_id,
                previous
                    .status
                    .map(|s| s.as_str())
                    .unwrap_or("unknown"),
                next.status.map(|s| s.as_str()).unwrap_or("unknown")
            );
        }

        if previous.notice != next.notice {
            self.events.publish(
                &self.project_id,
                StudioEventKind::Notice(next.notice.clone()),
            );
        }

        if view_changed(previous, next) {
            self.events
                .publish(&self.project_id, StudioEventKind::StatusChanged(next.clone()));
        }
    }

    fn lock_machine(&self) -> MutexGuard<'_, LifecycleMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Changes worth telling the preview pane about; a repeated probe result
/// with a new timestamp is not one.
fn view_changed(previous: &StatusSnapshot, next: &StatusSnapshot) -> bool {
    previous.status != next.status
        || previous.preview_address != next.preview_address
        || previous.health != next.health
        || previous.health_loading != next.health_loading
        || previous.preview_loading != next.preview_loading
        || previous.preview_running != next.preview_running
}
