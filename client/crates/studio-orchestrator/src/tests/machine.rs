use crate::lifecycle::{LifecycleEffect, LifecycleInput, LifecycleMachine, UserAction};

use studio_client::ProjectInfo;
use studio_core::{DevServerHealthState, HealthResult, NoticeLevel, ProjectStatus};

use googletest::prelude::*;
use proptest::prelude::*;

fn push(status: ProjectStatus, preview_url: Option<&str>) -> LifecycleInput {
    LifecycleInput::Push {
        status,
        preview_url: preview_url.map(String::from),
        message: None,
    }
}

fn info(status: ProjectStatus, preview_url: Option<&str>) -> ProjectInfo {
    ProjectInfo {
        id: Some(String::from("p")),
        name: None,
        status,
        preview_url: preview_url.map(String::from),
        dev_server_url: None,
    }
}

fn ready(machine: &LifecycleMachine) -> LifecycleInput {
    LifecycleInput::Health {
        epoch: machine.epoch(),
        result: HealthResult::new(DevServerHealthState::Ready, 12),
    }
}

#[test]
fn given_unknown_status_when_pushed_active_then_health_confirmation_starts() {
    // Given
    let mut machine = LifecycleMachine::new(None);

    // When
    let effects = machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));

    // Then
    let snapshot = machine.snapshot();
    assert_that!(snapshot.status, some(eq(ProjectStatus::Active)));
    assert_that!(snapshot.preview_address.as_deref(), some(eq("https://p1.example")));
    assert_that!(snapshot.health, eq(DevServerHealthState::Unavailable));
    assert_that!(snapshot.health_loading, eq(true));
    assert_that!(machine.is_confirming(), eq(true));
    assert!(effects.contains(&LifecycleEffect::ConfirmHealth {
        epoch: machine.epoch()
    }));
    assert!(effects.contains(&LifecycleEffect::CachePreviewAddress(String::from(
        "https://p1.example"
    ))));
    assert!(!effects.contains(&LifecycleEffect::TriggerPreviewStart));
}

#[test]
fn given_active_when_health_ready_then_preview_running_and_notice_cleared() {
    // Given
    let mut machine = LifecycleMachine::new(None);
    machine.apply(push(ProjectStatus::Creating, None));
    machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));

    // When
    machine.apply(ready(&machine));

    // Then
    let snapshot = machine.snapshot();
    assert_that!(snapshot.is_preview_ready(), eq(true));
    assert_that!(snapshot.preview_running, eq(true));
    assert_that!(snapshot.notice, none());
}

#[test]
fn given_poll_issued_before_push_when_applied_then_discarded() {
    // Given
    let mut machine = LifecycleMachine::new(None);
    let ticket = machine.poll_ticket();
    machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));

    // When
    let effects = machine.apply(LifecycleInput::Poll {
        ticket,
        info: info(ProjectStatus::Starting, None),
    });

    // Then
    assert_that!(effects, is_empty());
    assert_that!(machine.snapshot().status, some(eq(ProjectStatus::Active)));
    assert_that!(
        machine.snapshot().preview_address.as_deref(),
        some(eq("https://p1.example"))
    );
}

#[test]
fn given_fresh_ticket_when_poll_applied_then_status_adopted() {
    let mut machine = LifecycleMachine::new(None);
    let ticket = machine.poll_ticket();

    machine.apply(LifecycleInput::Poll {
        ticket,
        info: info(ProjectStatus::Starting, None),
    });

    assert_that!(machine.snapshot().status, some(eq(ProjectStatus::Starting)));
}

#[test]
fn given_failed_when_pushed_active_then_stays_failed() {
    // Given
    let mut machine = LifecycleMachine::new(None);
    machine.apply(LifecycleInput::Push {
        status: ProjectStatus::Failed,
        preview_url: None,
        message: Some(String::from("npm install failed")),
    });

    // When
    machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));

    // Then
    let snapshot = machine.snapshot();
    assert_that!(snapshot.status, some(eq(ProjectStatus::Failed)));
    let notice = snapshot.notice.clone().expect("failure notice");
    assert_that!(notice.level, eq(NoticeLevel::Error));
    assert_that!(notice.message.as_str(), eq("npm install failed"));
}

#[test]
fn given_failed_when_restarted_then_starting_again() {
    let mut machine = LifecycleMachine::new(None);
    machine.apply(push(ProjectStatus::Failed, None));

    machine.apply(LifecycleInput::User(UserAction::Restart));

    assert_that!(machine.snapshot().status, some(eq(ProjectStatus::Starting)));
    assert_that!(machine.snapshot().notice, none());
}

#[test]
fn given_stopped_when_pushed_then_address_kept_and_warning_raised() {
    // Given
    let mut machine = LifecycleMachine::new(None);
    machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));

    // When
    machine.apply(push(ProjectStatus::Stopped, None));

    // Then
    let snapshot = machine.snapshot();
    assert_that!(snapshot.preview_address.as_deref(), some(eq("https://p1.example")));
    assert_that!(snapshot.health, eq(DevServerHealthState::Inactive));
    assert_that!(snapshot.health_loading, eq(false));
    assert_that!(
        snapshot.notice.as_ref().map(|n| n.level),
        some(eq(NoticeLevel::Warning))
    );
}

#[test]
fn given_cached_address_when_archived_on_load_then_cache_shown() {
    let mut machine = LifecycleMachine::new(Some(String::from("https://cached.example")));

    machine.apply(push(ProjectStatus::Archived, None));

    assert_that!(
        machine.snapshot().preview_address.as_deref(),
        some(eq("https://cached.example"))
    );
}

#[test]
fn given_blank_cached_address_when_created_then_no_address() {
    let machine = LifecycleMachine::new(Some(String::from("   ")));

    assert_that!(machine.snapshot().preview_address, none());
}

#[test]
fn given_confirmation_exhausted_when_not_ready_then_still_provisioning_notice() {
    // Given
    let mut machine = LifecycleMachine::new(None);
    machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));

    // When
    let effects = machine.apply(LifecycleInput::ConfirmationExhausted {
        epoch: machine.epoch(),
    });

    // Then
    let snapshot = machine.snapshot();
    assert_that!(snapshot.health_loading, eq(true));
    assert_that!(
        snapshot.notice.as_ref().map(|n| n.level),
        some(eq(NoticeLevel::Info))
    );
    assert!(effects.contains(&LifecycleEffect::TriggerPreviewStart));
}

#[test]
fn given_old_epoch_when_health_arrives_then_ignored() {
    // Given
    let mut machine = LifecycleMachine::new(None);
    machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));
    let stale_epoch = machine.epoch();
    machine.apply(push(ProjectStatus::Stopped, None));
    machine.apply(push(ProjectStatus::Active, None));

    // When
    machine.apply(LifecycleInput::Health {
        epoch: stale_epoch,
        result: HealthResult::new(DevServerHealthState::Ready, 5),
    });

    // Then
    assert_that!(machine.snapshot().preview_running, eq(false));
}

#[test]
fn given_server_restart_when_active_then_reconfirms_and_refreshes() {
    // Given
    let mut machine = LifecycleMachine::new(None);
    machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));
    machine.apply(ready(&machine));

    // When
    let effects = machine.apply(LifecycleInput::ServerRestarted);

    // Then
    assert_that!(machine.snapshot().health, eq(DevServerHealthState::Unavailable));
    assert_that!(machine.snapshot().preview_running, eq(false));
    assert!(effects.contains(&LifecycleEffect::ConfirmHealth {
        epoch: machine.epoch()
    }));
    assert!(effects.contains(&LifecycleEffect::RefreshStatus));
}

#[test]
fn given_stop_when_active_again_then_auto_trigger_rearmed() {
    // Given
    let mut machine = LifecycleMachine::new(None);
    machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));
    let first = machine.apply(LifecycleInput::ConfirmationExhausted {
        epoch: machine.epoch(),
    });
    assert!(first.contains(&LifecycleEffect::TriggerPreviewStart));

    // When
    machine.apply(LifecycleInput::User(UserAction::Stop));
    machine.apply(push(ProjectStatus::Active, None));
    let second = machine.apply(LifecycleInput::ConfirmationExhausted {
        epoch: machine.epoch(),
    });

    // Then
    assert!(second.contains(&LifecycleEffect::TriggerPreviewStart));
}

#[test]
fn given_failed_when_user_stops_then_still_failed_and_guard_reset() {
    // Given
    let mut machine = LifecycleMachine::new(None);
    machine.apply(push(ProjectStatus::Active, Some("https://p1.example")));
    machine.apply(LifecycleInput::ConfirmationExhausted {
        epoch: machine.epoch(),
    });
    machine.apply(push(ProjectStatus::Failed, None));
    assert_that!(machine.auto_trigger_fired(), eq(true));

    // When
    machine.apply(LifecycleInput::User(UserAction::Stop));

    // Then
    assert_that!(machine.snapshot().status, some(eq(ProjectStatus::Failed)));
    assert_that!(machine.auto_trigger_fired(), eq(false));

    // And only a restart leaves it
    machine.apply(LifecycleInput::User(UserAction::Restart));
    assert_that!(machine.snapshot().status, some(eq(ProjectStatus::Starting)));
}

#[derive(Debug, Clone)]
enum Step {
    Push(ProjectStatus, bool),
    Poll(ProjectStatus),
    User(UserAction),
    Ready,
    Exhausted,
    Restarted,
}

fn step() -> impl Strategy<Value = Step> {
    let status = proptest::sample::select(ProjectStatus::ALL.to_vec());
    let action = proptest::sample::select(vec![
        UserAction::Start,
        UserAction::Stop,
        UserAction::Restart,
    ]);
    prop_oneof![
        (status.clone(), any::<bool>()).prop_map(|(s, a)| Step::Push(s, a)),
        status.prop_map(Step::Poll),
        action.prop_map(Step::User),
        Just(Step::Ready),
        Just(Step::Exhausted),
        Just(Step::Restarted),
    ]
}

fn to_input(machine: &LifecycleMachine, step: &Step) -> LifecycleInput {
    match step {
        Step::Push(status, with_address) => push(
            *status,
            with_address.then_some("https://preview.example"),
        ),
        Step::Poll(status) => LifecycleInput::Poll {
            ticket: machine.poll_ticket(),
            info: info(*status, None),
        },
        Step::User(action) => LifecycleInput::User(*action),
        Step::Ready => ready(machine),
        Step::Exhausted => LifecycleInput::ConfirmationExhausted {
            epoch: machine.epoch(),
        },
        Step::Restarted => LifecycleInput::ServerRestarted,
    }
}

proptest! {
    #[test]
    fn auto_trigger_fires_at_most_once_between_stops(steps in proptest::collection::vec(step(), 1..40)) {
        let mut machine = LifecycleMachine::new(None);
        let mut triggers_since_stop = 0;

        for step in &steps {
            if matches!(step, Step::User(UserAction::Stop)) {
                triggers_since_stop = 0;
            }
            let input = to_input(&machine, step);
            let effects = machine.apply(input);
            triggers_since_stop += effects
                .iter()
                .filter(|e| **e == LifecycleEffect::TriggerPreviewStart)
                .count();
            prop_assert!(triggers_since_stop <= 1);
        }
    }

    #[test]
    fn failed_is_left_only_through_restart(steps in proptest::collection::vec(step(), 1..40)) {
        let mut machine = LifecycleMachine::new(None);

        for step in &steps {
            let was_failed = machine.snapshot().is_failed();
            let input = to_input(&machine, step);
            machine.apply(input);

            let restarted = matches!(step, Step::User(UserAction::Restart));
            if was_failed && !restarted {
                prop_assert!(machine.snapshot().is_failed());
            }
        }
    }
}
