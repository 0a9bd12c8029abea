//! Single bounded health check against a project's dev server.

use studio_client::ProjectApi;
use studio_core::{DevServerHealthState, HealthResult};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::debug;
use tokio::time::Instant;

#[derive(Clone)]
pub struct HealthProbe {
    projects: Arc<dyn ProjectApi>,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(projects: Arc<dyn ProjectApi>, timeout: Duration) -> Self {
        Self { projects, timeout }
    }

    /// One round trip, never retried and never an error.
    ///
    /// Transport failures, HTTP errors and timeouts classify as
    /// `unreachable`; an answer without payload as `unavailable`.
    pub async fn probe(&self, project_id: &str) -> HealthResult {
        let start = Instant::now();
        let outcome =
            tokio::time::timeout(self.timeout, self.projects.dev_server_health(project_id)).await;
        let measured_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(Some(payload))) => HealthResult {
                state: payload.state,
                latency_ms: payload.latency_ms.unwrap_or(measured_ms),
                http_status: payload.http_status,
                message: payload.message,
                checked_at: Utc::now(),
            },
            Ok(Ok(None)) => HealthResult::new(DevServerHealthState::Unavailable, measured_ms),
            Ok(Err(e)) => {
                debug!("Health check for {project_id} failed: {e}");
                HealthResult {
                    http_status: e.status(),
                    ..HealthResult::unreachable(measured_ms, e.user_message())
                }
            }
            Err(_) => {
                debug!(
                    "Health check for {project_id} timed out after {}ms",
                    self.timeout.as_millis()
                );
                HealthResult::unreachable(
                    measured_ms,
                    format!(
                        "Health check timed out after {}ms",
                        self.timeout.as_millis()
                    ),
                )
            }
        }
    }
}
