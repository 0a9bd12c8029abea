use crate::{DevServerHealthState, HealthResult};

use std::str::FromStr;

#[test]
fn test_health_state_from_str() {
    for state in DevServerHealthState::ALL {
        assert_eq!(DevServerHealthState::from_str(state.as_str()).unwrap(), state);
    }
    assert!(DevServerHealthState::from_str("healthy").is_err());
}

#[test]
fn test_health_state_default_is_inactive() {
    assert_eq!(DevServerHealthState::default(), DevServerHealthState::Inactive);
}

#[test]
fn test_unreachable_result_carries_message() {
    let result = HealthResult::unreachable(12, "connection refused");

    assert_eq!(result.state, DevServerHealthState::Unreachable);
    assert_eq!(result.latency_ms, 12);
    assert_eq!(result.message.as_deref(), Some("connection refused"));
    assert!(!result.is_ready());
}
