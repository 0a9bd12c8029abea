use crate::ProjectStatus;

use std::str::FromStr;

#[test]
fn test_project_status_as_str_round_trips_through_from_str() {
    for status in ProjectStatus::ALL {
        assert_eq!(ProjectStatus::from_str(status.as_str()).unwrap(), status);
    }
}

#[test]
fn test_project_status_from_str_rejects_unknown() {
    assert!(ProjectStatus::from_str("running").is_err());
    assert!(ProjectStatus::from_str("").is_err());
}

#[test]
fn test_project_status_serde_is_snake_case() {
    let json = serde_json::to_string(&ProjectStatus::Archived).unwrap();
    assert_eq!(json, "\"archived\"");

    let parsed: ProjectStatus = serde_json::from_str("\"starting\"").unwrap();
    assert_eq!(parsed, ProjectStatus::Starting);
}

#[test]
fn test_project_status_paused_and_provisioning_groups() {
    assert!(ProjectStatus::Stopped.is_paused());
    assert!(ProjectStatus::Archived.is_paused());
    assert!(!ProjectStatus::Active.is_paused());

    assert!(ProjectStatus::Creating.is_provisioning());
    assert!(ProjectStatus::Starting.is_provisioning());
    assert!(!ProjectStatus::Failed.is_provisioning());
}
