use studio_core::{
    DevServerHealthState, HealthResult, LifecycleNotice, ProjectStatus, preview_ready,
};

use serde::Serialize;
use tokio::sync::watch;

/// Everything the preview pane needs to render one project.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatusSnapshot {
    /// `None` until the first status arrives
    pub status: Option<ProjectStatus>,
    /// Last known preview URL; survives stop and archive
    pub preview_address: Option<String>,
    pub health: DevServerHealthState,
    pub last_health: Option<HealthResult>,
    /// A health confirmation or readiness wait is pending
    pub health_loading: bool,
    /// The preview pane should show a loading state
    pub preview_loading: bool,
    /// The preview is being served to the user
    pub preview_running: bool,
    pub notice: Option<LifecycleNotice>,
}

impl StatusSnapshot {
    pub fn is_preview_ready(&self) -> bool {
        preview_ready(self.status, self.preview_address.as_deref(), self.health)
    }

    pub fn is_failed(&self) -> bool {
        self.status == Some(ProjectStatus::Failed)
    }
}

/// Watch-backed holder of a project's [`StatusSnapshot`].
///
/// Cloning shares the same underlying channel. Only the lifecycle machinery
/// writes; everyone else reads or subscribes.
#[derive(Debug, Clone)]
pub struct StatusStore {
    sender: watch::Sender<StatusSnapshot>,
}

impl StatusStore {
    pub fn new(initial: StatusSnapshot) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.sender.borrow().clone()
    }

    pub fn status(&self) -> Option<ProjectStatus> {
        self.sender.borrow().status
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.sender.subscribe()
    }

    /// Replace the snapshot; subscribers are only woken on an actual change.
    pub(crate) fn publish(&self, snapshot: StatusSnapshot) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        })
    }
}

/// Resolve once the watched status turns `failed`. Never resolves if the
/// store goes away first.
pub(crate) async fn wait_for_failure(receiver: &mut watch::Receiver<StatusSnapshot>) {
    loop {
        if receiver.borrow_and_update().is_failed() {
            return;
        }
        if receiver.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
