//! Broadcast surface for collaborators outside the orchestrator (chat view,
//! preview pane, file browser, CLI).

use crate::deployment::DeploymentSnapshot;
use crate::external_deploy::ExternalDeploymentSnapshot;
use crate::restore::RestoreSnapshot;
use crate::status_store::StatusSnapshot;

use studio_core::LifecycleNotice;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudioEvent {
    pub project_id: String,
    #[serde(flatten)]
    pub kind: StudioEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum StudioEventKind {
    StatusChanged(StatusSnapshot),
    /// `None` clears the current notice
    Notice(Option<LifecycleNotice>),
    DeploymentChanged(DeploymentSnapshot),
    ExternalDeploymentChanged(ExternalDeploymentSnapshot),
    RestoreChanged(RestoreSnapshot),
    /// Files in the sandbox changed underneath the file browser
    FileTreeRefresh,
    /// The preview pane must reload even if its URL is unchanged
    PreviewReload,
}

/// Fan-out of [`StudioEvent`]s to any number of subscribers.
///
/// Events are immutable values; a subscriber that falls more than the
/// channel capacity behind skips ahead and is told how much it missed.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StudioEvent>,
}

impl EventBus {
    pub fn new(channel_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity);
        Self { sender }
    }

    /// Publish an event, returning how many subscribers received it
    pub fn publish(&self, project_id: &str, kind: StudioEventKind) -> usize {
        let event = StudioEvent {
            project_id: project_id.to_string(),
            kind,
        };

        match self.sender.send(event) {
            Ok(receiver_count) => receiver_count,
            Err(_) => {
                // No active receivers - nobody is watching this workspace yet
                log::trace!("Event for project {} had no active receivers", project_id);
                0
            }
        }
    }

    /// Receive every event on the bus
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
            project_id: None,
        }
    }

    /// Receive only events for one project
    pub fn subscribe_project(&self, project_id: &str) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
            project_id: Some(project_id.to_string()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub struct EventSubscription {
    receiver: broadcast::Receiver<StudioEvent>,
    project_id: Option<String>,
}

impl EventSubscription {
    /// Next matching event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<StudioEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("Event subscriber lagged, skipped {missed} events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`EventSubscription::recv`].
    pub fn try_recv(&mut self) -> Option<StudioEvent> {
        use broadcast::error::TryRecvError;

        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(missed)) => {
                    log::warn!("Event subscriber lagged, skipped {missed} events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    fn matches(&self, event: &StudioEvent) -> bool {
        self.project_id
            .as_deref()
            .is_none_or(|id| id == event.project_id)
    }
}
