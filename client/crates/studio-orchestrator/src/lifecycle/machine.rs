//! Project status state machine.
//!
//! Every trigger (push, poll, user action, health observation) goes through
//! [`LifecycleMachine::apply`], which mutates the canonical snapshot and
//! returns the side effects to run. The machine itself never touches the
//! network, which keeps the one-auto-trigger rule and the stale-poll rule in
//! one place.

use crate::status_store::StatusSnapshot;

use studio_client::ProjectInfo;
use studio_core::{
    DevServerHealthState, HealthResult, LifecycleNotice, ProjectStatus, ProjectStatusPush,
    has_preview_address,
};

use log::debug;

const NOTICE_CREATING: &str = "Setting up your development environment...";
const NOTICE_STOPPED: &str = "Your environment is stopped. Start it to resume the live preview.";
const NOTICE_ARCHIVED: &str =
    "This project is archived. Start it again to resume the live preview.";
const NOTICE_FAILED: &str =
    "The development environment failed to start. Restart it to try again.";
const NOTICE_STILL_PROVISIONING: &str =
    "Still provisioning the preview. It will appear as soon as the dev server responds.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Start,
    Stop,
    /// Clears a sticky `failed` status, then starts
    Restart,
}

/// Authority revision captured when a poll is issued.
///
/// A poll result is only applied if no push or user action landed while the
/// request was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    authority_rev: u64,
}

#[derive(Debug, Clone)]
pub enum LifecycleInput {
    Push {
        status: ProjectStatus,
        preview_url: Option<String>,
        message: Option<String>,
    },
    Poll {
        ticket: PollTicket,
        info: ProjectInfo,
    },
    User(UserAction),
    /// Health observation made while `epoch` was current
    Health {
        epoch: u64,
        result: HealthResult,
    },
    ConfirmationExhausted {
        epoch: u64,
    },
    PreviewStarted {
        url: Option<String>,
    },
    ServerRestarted,
}

impl From<&ProjectStatusPush> for LifecycleInput {
    fn from(push: &ProjectStatusPush) -> Self {
        LifecycleInput::Push {
            status: push.status,
            preview_url: push.preview_url.clone(),
            message: push.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEffect {
    /// Probe health a bounded number of times for this status epoch
    ConfirmHealth { epoch: u64 },
    /// Start the preview and wait for it through the single-flight waiter
    TriggerPreviewStart,
    CachePreviewAddress(String),
    RefreshStatus,
}

#[derive(Debug, Clone)]
pub struct LifecycleMachine {
    snapshot: StatusSnapshot,
    cached_address: Option<String>,
    /// Bumped by every push and user action
    authority_rev: u64,
    /// Bumped whenever the status changes or the server restarts
    epoch: u64,
    auto_trigger_fired: bool,
    confirming: bool,
}

impl LifecycleMachine {
    /// A machine with unknown status, seeded with the session's cached
    /// preview address.
    pub fn new(cached_address: Option<String>) -> Self {
        let cached_address = cached_address.filter(|a| has_preview_address(Some(a.as_str())));
        Self {
            snapshot: StatusSnapshot {
                preview_address: cached_address.clone(),
                ..StatusSnapshot::default()
            },
            cached_address,
            authority_rev: 0,
            epoch: 0,
            auto_trigger_fired: false,
            confirming: false,
        }
    }

    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn poll_ticket(&self) -> PollTicket {
        PollTicket {
            authority_rev: self.authority_rev,
        }
    }

    pub fn is_confirming(&self) -> bool {
        self.confirming
    }

    pub fn auto_trigger_fired(&self) -> bool {
        self.auto_trigger_fired
    }

    pub fn apply(&mut self, input: LifecycleInput) -> Vec<LifecycleEffect> {
        let mut effects = Vec::new();

        match input {
            LifecycleInput::Push {
                status,
                preview_url,
                message,
            } => {
                self.authority_rev += 1;
                self.transition(status, preview_url.as_deref(), message, false, &mut effects);
            }
            LifecycleInput::Poll { ticket, info } => {
                if ticket.authority_rev != self.authority_rev {
                    debug!(
                        "Discarding stale poll result ({} issued before an authoritative write)",
                        info.status
                    );
                    return effects;
                }
                self.transition(
                    info.status,
                    info.reported_preview_address(),
                    None,
                    false,
                    &mut effects,
                );
            }
            LifecycleInput::User(action) => self.user_action(action, &mut effects),
            LifecycleInput::Health { epoch, result } => {
                if epoch != self.epoch {
                    debug!("Discarding health observation from epoch {epoch}");
                    return effects;
                }
                self.observe_health(result);
            }
            LifecycleInput::ConfirmationExhausted { epoch } => {
                if epoch != self.epoch || self.snapshot.status != Some(ProjectStatus::Active) {
                    return effects;
                }
                self.confirming = false;
                if !self.snapshot.preview_running {
                    self.snapshot.health_loading = true;
                    self.snapshot.preview_loading = true;
                    self.snapshot.notice = Some(LifecycleNotice::info(NOTICE_STILL_PROVISIONING));
                }
            }
            LifecycleInput::PreviewStarted { url } => {
                if let Some(url) = url.as_deref().filter(|u| has_preview_address(Some(*u))) {
                    self.adopt_address(url, &mut effects);
                }
                if self.snapshot.status == Some(ProjectStatus::Active)
                    && !self.snapshot.preview_running
                {
                    self.snapshot.preview_loading = true;
                }
            }
            LifecycleInput::ServerRestarted => {
                self.epoch += 1;
                self.snapshot.preview_running = false;
                if self.snapshot.status == Some(ProjectStatus::Active) {
                    self.snapshot.health = DevServerHealthState::Unavailable;
                    self.snapshot.health_loading = true;
                    self.snapshot.preview_loading = true;
                    self.confirming = true;
                    effects.push(LifecycleEffect::ConfirmHealth { epoch: self.epoch });
                }
                effects.push(LifecycleEffect::RefreshStatus);
            }
        }

        self.check_auto_trigger(&mut effects);
        effects
    }

    fn user_action(&mut self, action: UserAction, effects: &mut Vec<LifecycleEffect>) {
        self.authority_rev += 1;

        match action {
            UserAction::Start => {
                if self.snapshot.is_failed() {
                    return;
                }
                // An explicit start replaces the automatic one
                self.auto_trigger_fired = true;
                match self.snapshot.status {
                    Some(ProjectStatus::Active) => {
                        self.snapshot.preview_loading = !self.snapshot.preview_running;
                    }
                    Some(ProjectStatus::Creating | ProjectStatus::Starting) => {}
                    _ => self.transition(ProjectStatus::Starting, None, None, false, effects),
                }
            }
            UserAction::Stop => {
                self.auto_trigger_fired = false;
                // Only restart clears a failure
                self.transition(ProjectStatus::Stopped, None, None, false, effects);
            }
            UserAction::Restart => {
                self.auto_trigger_fired = true;
                self.transition(ProjectStatus::Starting, None, None, true, effects);
            }
        }
    }

    fn transition(
        &mut self,
        status: ProjectStatus,
        reported_address: Option<&str>,
        message: Option<String>,
        force: bool,
        effects: &mut Vec<LifecycleEffect>,
    ) {
        let current = self.snapshot.status;

        if current == Some(ProjectStatus::Failed) && status != ProjectStatus::Failed && !force {
            debug!("Ignoring {status} while failed; waiting for an explicit restart");
            return;
        }

        match reported_address.filter(|a| has_preview_address(Some(*a))) {
            Some(address) => self.adopt_address(address, effects),
            None if self.snapshot.preview_address.is_none() => {
                self.snapshot.preview_address = self.cached_address.clone();
            }
            None => {}
        }

        if current == Some(status) {
            return;
        }

        self.epoch += 1;
        self.confirming = false;
        self.snapshot.status = Some(status);

        match status {
            ProjectStatus::Active => {
                self.snapshot.health = DevServerHealthState::Unavailable;
                self.snapshot.health_loading = true;
                self.snapshot.preview_loading = true;
                self.snapshot.preview_running = false;
                self.snapshot.notice = None;
                self.confirming = true;
                effects.push(LifecycleEffect::ConfirmHealth { epoch: self.epoch });
            }
            ProjectStatus::Starting => {
                self.snapshot.health = DevServerHealthState::Inactive;
                self.snapshot.health_loading = true;
                self.snapshot.preview_loading = true;
                self.snapshot.preview_running = false;
                self.snapshot.notice = None;
            }
            ProjectStatus::Stopped | ProjectStatus::Archived => {
                self.snapshot.health = DevServerHealthState::Inactive;
                self.snapshot.health_loading = false;
                self.snapshot.preview_loading = false;
                self.snapshot.preview_running = false;
                let hint = if status == ProjectStatus::Stopped {
                    NOTICE_STOPPED
                } else {
                    NOTICE_ARCHIVED
                };
                self.snapshot.notice = Some(LifecycleNotice::warning(hint));
            }
            ProjectStatus::Creating => {
                self.snapshot.health = DevServerHealthState::Inactive;
                self.snapshot.health_loading = true;
                self.snapshot.preview_loading = true;
                self.snapshot.preview_running = false;
                self.snapshot.notice = Some(LifecycleNotice::info(NOTICE_CREATING));
            }
            ProjectStatus::Failed => {
                self.snapshot.health_loading = false;
                self.snapshot.preview_loading = false;
                self.snapshot.preview_running = false;
                let text = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| String::from(NOTICE_FAILED));
                self.snapshot.notice = Some(LifecycleNotice::error(text));
            }
        }
    }

    fn observe_health(&mut self, result: HealthResult) {
        let ready = result.is_ready();
        self.snapshot.health = result.state;
        self.snapshot.last_health = Some(result);

        if ready && self.snapshot.status == Some(ProjectStatus::Active) {
            self.confirming = false;
            self.snapshot.health_loading = false;
            if self.snapshot.preview_address.is_some() {
                self.snapshot.preview_loading = false;
                self.snapshot.preview_running = true;
                self.snapshot.notice = None;
            }
        }
    }

    fn adopt_address(&mut self, address: &str, effects: &mut Vec<LifecycleEffect>) {
        if self.snapshot.preview_address.as_deref() != Some(address) {
            self.snapshot.preview_address = Some(address.to_string());
        }
        if self.cached_address.as_deref() != Some(address) {
            self.cached_address = Some(address.to_string());
            effects.push(LifecycleEffect::CachePreviewAddress(address.to_string()));
        }
    }

    fn check_auto_trigger(&mut self, effects: &mut Vec<LifecycleEffect>) {
        let eligible = self.snapshot.status == Some(ProjectStatus::Active)
            && has_preview_address(self.snapshot.preview_address.as_deref())
            && !self.snapshot.preview_running
            && !self.confirming
            && !self.auto_trigger_fired;

        if eligible {
            self.auto_trigger_fired = true;
            effects.push(LifecycleEffect::TriggerPreviewStart);
        }
    }
}
