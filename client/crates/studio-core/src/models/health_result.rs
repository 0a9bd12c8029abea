use crate::DevServerHealthState;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single dev-server health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResult {
    pub state: DevServerHealthState,
    pub latency_ms: u64,
    pub http_status: Option<u16>,
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthResult {
    pub fn new(state: DevServerHealthState, latency_ms: u64) -> Self {
        Self {
            state,
            latency_ms,
            http_status: None,
            message: None,
            checked_at: Utc::now(),
        }
    }

    /// Probe failed before the backend could answer.
    pub fn unreachable(latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(DevServerHealthState::Unreachable, latency_ms)
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == DevServerHealthState::Ready
    }
}
