use crate::{ConfigError, ConfigErrorResult};

use std::time::Duration;

use serde::Deserialize;

pub const MIN_POLL_INTERVAL_SECS: u64 = 1;
pub const MAX_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

pub const MIN_MAX_POLL_ATTEMPTS: u32 = 1;
pub const MAX_MAX_POLL_ATTEMPTS: u32 = 1000;
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

pub const DEFAULT_SUBDOMAIN_SUFFIX: &str = "studio.app";

pub const DEFAULT_EXTERNAL_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_EXTERNAL_MAX_POLL_ATTEMPTS: u32 = 300;

/// Publish and external-build polling settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    /// Published apps live at `<subdomain>.<suffix>`
    pub subdomain_suffix: String,
    pub external_poll_interval_secs: u64,
    pub external_max_poll_attempts: u32,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            subdomain_suffix: String::from(DEFAULT_SUBDOMAIN_SUFFIX),
            external_poll_interval_secs: DEFAULT_EXTERNAL_POLL_INTERVAL_SECS,
            external_max_poll_attempts: DEFAULT_EXTERNAL_MAX_POLL_ATTEMPTS,
        }
    }
}

impl DeploymentConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (name, value) in [
            ("poll_interval_secs", self.poll_interval_secs),
            ("external_poll_interval_secs", self.external_poll_interval_secs),
        ] {
            if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&value) {
                return Err(ConfigError::deployment(format!(
                    "deployment.{} must be {}-{}, got {}",
                    name, MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS, value
                )));
            }
        }

        for (name, value) in [
            ("max_poll_attempts", self.max_poll_attempts),
            ("external_max_poll_attempts", self.external_max_poll_attempts),
        ] {
            if !(MIN_MAX_POLL_ATTEMPTS..=MAX_MAX_POLL_ATTEMPTS).contains(&value) {
                return Err(ConfigError::deployment(format!(
                    "deployment.{} must be {}-{}, got {}",
                    name, MIN_MAX_POLL_ATTEMPTS, MAX_MAX_POLL_ATTEMPTS, value
                )));
            }
        }

        let suffix = self.subdomain_suffix.trim();
        if suffix.is_empty() || suffix.starts_with('.') || suffix.ends_with('.') {
            return Err(ConfigError::deployment(format!(
                "deployment.subdomain_suffix must be a bare domain, got '{}'",
                self.subdomain_suffix
            )));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn external_poll_interval(&self) -> Duration {
        Duration::from_secs(self.external_poll_interval_secs)
    }
}
