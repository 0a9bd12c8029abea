use crate::{ConfigError, ConfigErrorResult};

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const MIN_HEALTH_TIMEOUT_MS: u64 = 100;
pub const MAX_HEALTH_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 5_000;

/// REST API connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend base URL (e.g., "https://api.studio.dev")
    pub base_url: String,
    /// Sent as X-User-Id when set
    pub user_id: Option<String>,
    /// Timeout for ordinary API requests
    pub request_timeout_secs: u64,
    /// Upper bound for a single dev-server health probe
    pub health_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            user_id: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            health_timeout_ms: DEFAULT_HEALTH_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::api(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        if self.request_timeout_secs < MIN_REQUEST_TIMEOUT_SECS
            || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(ConfigError::api(format!(
                "api.request_timeout_secs must be {}-{}, got {}",
                MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS, self.request_timeout_secs
            )));
        }

        if self.health_timeout_ms < MIN_HEALTH_TIMEOUT_MS
            || self.health_timeout_ms > MAX_HEALTH_TIMEOUT_MS
        {
            return Err(ConfigError::api(format!(
                "api.health_timeout_ms must be {}-{}, got {}",
                MIN_HEALTH_TIMEOUT_MS, MAX_HEALTH_TIMEOUT_MS, self.health_timeout_ms
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}
