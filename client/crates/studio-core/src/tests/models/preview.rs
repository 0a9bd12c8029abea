use crate::{DevServerHealthState, ProjectStatus, has_preview_address, preview_ready};

use proptest::prelude::*;

#[test]
fn given_every_input_combination_when_gated_then_only_active_addressed_ready_passes() {
    let addresses = [None, Some("https://p1.example")];

    for status in ProjectStatus::ALL.into_iter().map(Some).chain([None]) {
        for address in addresses {
            for health in DevServerHealthState::ALL {
                let expected = status == Some(ProjectStatus::Active)
                    && address.is_some()
                    && health == DevServerHealthState::Ready;

                assert_eq!(
                    preview_ready(status, address, health),
                    expected,
                    "status={status:?} address={address:?} health={health:?}"
                );
            }
        }
    }
}

#[test]
fn given_blank_address_when_gated_then_not_ready() {
    assert!(!has_preview_address(Some("")));
    assert!(!has_preview_address(Some("   ")));
    assert!(!preview_ready(
        Some(ProjectStatus::Active),
        Some(""),
        DevServerHealthState::Ready
    ));
}

fn any_status() -> impl Strategy<Value = Option<ProjectStatus>> {
    prop_oneof![
        Just(None),
        proptest::sample::select(ProjectStatus::ALL.to_vec()).prop_map(Some),
    ]
}

fn any_health() -> impl Strategy<Value = DevServerHealthState> {
    proptest::sample::select(DevServerHealthState::ALL.to_vec())
}

proptest! {
    #[test]
    fn given_any_non_active_status_when_gated_then_never_ready(
        status in any_status(),
        address in proptest::option::of("https://[a-z]{1,12}\\.example"),
        health in any_health(),
    ) {
        prop_assume!(status != Some(ProjectStatus::Active));
        prop_assert!(!preview_ready(status, address.as_deref(), health));
    }

    #[test]
    fn given_active_with_address_when_gated_then_ready_tracks_health(
        address in "https://[a-z]{1,12}\\.example",
        health in any_health(),
    ) {
        prop_assert_eq!(
            preview_ready(Some(ProjectStatus::Active), Some(address.as_str()), health),
            health == DevServerHealthState::Ready
        );
    }
}
