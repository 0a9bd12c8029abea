//! Two-phase restore of the sandbox filesystem to an earlier snapshot.
//!
//! A proposal materializes the snapshot temporarily so the preview can show
//! it; the user then either confirms (the snapshot becomes the new head) or
//! cancels (the head captured at proposal time comes back).

use crate::events::{EventBus, StudioEventKind};
use crate::lifecycle::LifecycleController;
use crate::{OrchestratorError, OrchestratorResult};

use studio_client::{ClientError, CommitInfo, RestoreConfirmRequest, SnapshotApi};
use studio_core::{RestorePush, RestoreState, SnapshotDiffPush};

use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RestoreSnapshot {
    pub state: RestoreState,
    /// Snapshot being previewed
    pub snapshot_id: Option<String>,
    /// Head at proposal time; the rollback point for cancel
    pub original_head: Option<String>,
    pub error: Option<String>,
}

pub struct RestoreCoordinator {
    project_id: String,
    snapshots: Arc<dyn SnapshotApi>,
    lifecycle: Arc<LifecycleController>,
    events: EventBus,
    state: watch::Sender<RestoreSnapshot>,
}

impl RestoreCoordinator {
    pub fn new(
        project_id: &str,
        snapshots: Arc<dyn SnapshotApi>,
        lifecycle: Arc<LifecycleController>,
        events: EventBus,
    ) -> Self {
        let (state, _) = watch::channel(RestoreSnapshot::default());
        Self {
            project_id: project_id.to_string(),
            snapshots,
            lifecycle,
            events,
            state,
        }
    }

    pub fn snapshot(&self) -> RestoreSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RestoreSnapshot> {
        self.state.subscribe()
    }

    /// Newest first.
    pub async fn commits(&self, limit: u32) -> OrchestratorResult<Vec<CommitInfo>> {
        Ok(self.snapshots.commits(&self.project_id, limit).await?)
    }

    /// Materialize `target` temporarily and wait for confirm or cancel.
    ///
    /// Proposing again while a previous proposal awaits confirmation replaces
    /// it, rollback point included.
    pub async fn propose(&self, target: &str) -> OrchestratorResult<RestoreSnapshot> {
        let target = target.trim();
        if target.is_empty() {
            return Err(OrchestratorError::restore_failed("no snapshot selected"));
        }

        let began = self.state.send_if_modified(|s| {
            if s.state == RestoreState::Loading {
                return false;
            }
            *s = RestoreSnapshot {
                state: RestoreState::Loading,
                snapshot_id: Some(target.to_string()),
                ..RestoreSnapshot::default()
            };
            true
        });
        if !began {
            return Err(OrchestratorError::restore_in_flight());
        }
        self.announce();

        match self.materialize(target).await {
            Ok(original_head) => {
                self.update(|s| {
                    s.state = RestoreState::Confirming;
                    s.original_head = original_head;
                });
                info!("Snapshot {target} of {} is ready for review", self.project_id);
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!("Restore of {target} for {} failed: {e}", self.project_id);
                let message = e.user_message();
                self.update(|s| {
                    *s = RestoreSnapshot {
                        error: Some(message),
                        ..RestoreSnapshot::default()
                    }
                });
                Err(OrchestratorError::restore_failed(e.user_message()))
            }
        }
    }

    /// Make the previewed snapshot permanent.
    pub async fn confirm(
        &self,
        session_id: Option<&str>,
        chat_room_id: Option<&str>,
    ) -> OrchestratorResult<()> {
        let pending = self.pending()?;
        let Some(snapshot_id) = pending.snapshot_id else {
            return Err(OrchestratorError::no_pending_restore());
        };

        let request = RestoreConfirmRequest {
            snapshot_id: snapshot_id.clone(),
            session_id: session_id.map(String::from),
            chat_room_id: chat_room_id.map(String::from),
        };
        if let Err(e) = self.snapshots.restore_confirm(&self.project_id, &request).await {
            return Err(self.keep_confirming(&e));
        }

        self.events
            .publish(&self.project_id, StudioEventKind::FileTreeRefresh);
        self.lifecycle.reload_preview();
        self.update(|s| *s = RestoreSnapshot::default());
        info!("Restore of {snapshot_id} for {} confirmed", self.project_id);
        Ok(())
    }

    /// Put back the head captured when the restore was proposed.
    pub async fn cancel(&self) -> OrchestratorResult<()> {
        let pending = self.pending()?;

        match self.snapshots.restore_cancel(&self.project_id).await {
            Ok(()) => {}
            Err(e) if e.is_unsupported() => {
                let Some(head) = pending.original_head.as_deref() else {
                    let message = String::from("no rollback point was captured");
                    self.update(|s| s.error = Some(message.clone()));
                    return Err(OrchestratorError::restore_failed(message));
                };
                debug!("Restore cancel unsupported; rolling {} back to {head}", self.project_id);
                if let Err(e) = self.snapshots.restore_temp(&self.project_id, head, false).await {
                    return Err(self.keep_confirming(&e));
                }
            }
            Err(e) => return Err(self.keep_confirming(&e)),
        }

        self.events
            .publish(&self.project_id, StudioEventKind::FileTreeRefresh);
        self.lifecycle.reload_preview();
        self.update(|s| *s = RestoreSnapshot::default());
        info!("Restore for {} cancelled", self.project_id);
        Ok(())
    }

    /// Another client restored a snapshot. The tracked request is untouched.
    pub fn handle_restore_push(&self, push: &RestorePush) {
        info!(
            "Snapshot {} restored for {} elsewhere",
            push.snapshot_id, self.project_id
        );
        self.events
            .publish(&self.project_id, StudioEventKind::FileTreeRefresh);
        self.lifecycle.reload_preview();
    }

    pub fn handle_snapshot_diff(&self, push: &SnapshotDiffPush) {
        debug!(
            "{} files changed in {}",
            push.files_changed.len(),
            self.project_id
        );
        self.events
            .publish(&self.project_id, StudioEventKind::FileTreeRefresh);
    }

    /// Capture the head, then restore temporarily. Returns the head.
    async fn materialize(&self, target: &str) -> OrchestratorResult<Option<String>> {
        let head = self
            .snapshots
            .commits(&self.project_id, 1)
            .await?
            .into_iter()
            .next()
            .map(|commit| commit.id);

        self.snapshots
            .restore_temp(&self.project_id, target, true)
            .await?;

        self.events
            .publish(&self.project_id, StudioEventKind::FileTreeRefresh);
        self.lifecycle.reload_preview();
        Ok(head)
    }

    fn pending(&self) -> OrchestratorResult<RestoreSnapshot> {
        let snapshot = self.snapshot();
        if snapshot.state != RestoreState::Confirming {
            return Err(OrchestratorError::no_pending_restore());
        }
        Ok(snapshot)
    }

    fn keep_confirming(&self, err: &ClientError) -> OrchestratorError {
        warn!("Restore request for {} failed: {err}", self.project_id);
        let message = err.user_message();
        self.update(|s| s.error = Some(message.clone()));
        OrchestratorError::restore_failed(message)
    }

    fn update(&self, modify: impl FnOnce(&mut RestoreSnapshot)) {
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
            StudioEventKind::RestoreChanged(self.snapshot()),
        );
    }
}
