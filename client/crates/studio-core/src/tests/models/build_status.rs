use crate::BuildStatus;

use std::str::FromStr;

#[test]
fn test_build_status_folds_remote_spellings() {
    assert_eq!(BuildStatus::from_str("QUEUED").unwrap(), BuildStatus::Pending);
    assert_eq!(BuildStatus::from_str("INITIALIZING").unwrap(), BuildStatus::Pending);
    assert_eq!(BuildStatus::from_str("BUILDING").unwrap(), BuildStatus::Building);
    assert_eq!(BuildStatus::from_str("in_progress").unwrap(), BuildStatus::Building);
    assert_eq!(BuildStatus::from_str("READY").unwrap(), BuildStatus::Success);
    assert_eq!(BuildStatus::from_str("success").unwrap(), BuildStatus::Success);
    assert_eq!(BuildStatus::from_str("ERROR").unwrap(), BuildStatus::Failed);
    assert_eq!(BuildStatus::from_str("CANCELED").unwrap(), BuildStatus::Failed);
}

#[test]
fn test_build_status_rejects_unknown() {
    assert!(BuildStatus::from_str("exploded").is_err());
}

#[test]
fn test_build_status_deserializes_through_aliases() {
    let status: BuildStatus = serde_json::from_str("\"READY\"").unwrap();
    assert_eq!(status, BuildStatus::Success);
    assert!(serde_json::from_str::<BuildStatus>("\"nope\"").is_err());
}

#[test]
fn test_build_status_terminal() {
    assert!(BuildStatus::Success.is_terminal());
    assert!(BuildStatus::Failed.is_terminal());
    assert!(!BuildStatus::Pending.is_terminal());
    assert!(!BuildStatus::Building.is_terminal());
}
