use crate::{ConfigError, ConfigErrorResult};

use std::time::Duration;

use serde::Deserialize;

pub const MIN_MAX_ATTEMPTS: u32 = 1;
pub const MAX_MAX_ATTEMPTS: u32 = 600;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

pub const MIN_INTERVAL_MS: u64 = 10;
pub const MAX_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;

pub const DEFAULT_STATUS_REFRESH_EVERY: u32 = 5;

pub const MIN_CONFIRM_ATTEMPTS: u32 = 1;
pub const MAX_CONFIRM_ATTEMPTS: u32 = 120;
pub const DEFAULT_CONFIRM_ATTEMPTS: u32 = 10;
pub const DEFAULT_CONFIRM_INTERVAL_MS: u64 = 1_000;

/// Readiness polling budgets.
///
/// The sandbox boot time is bounded and roughly constant, so polling uses a
/// fixed interval with a periodic full status refresh rather than backoff.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Health probes per readiness wait
    pub max_attempts: u32,
    /// Delay between probes
    pub interval_ms: u64,
    /// Re-pull project status every N attempts
    pub status_refresh_every: u32,
    /// Probes in the inline confirmation after a transition to active
    pub confirm_attempts: u32,
    /// Delay between confirmation probes
    pub confirm_interval_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval_ms: DEFAULT_INTERVAL_MS,
            status_refresh_every: DEFAULT_STATUS_REFRESH_EVERY,
            confirm_attempts: DEFAULT_CONFIRM_ATTEMPTS,
            confirm_interval_ms: DEFAULT_CONFIRM_INTERVAL_MS,
        }
    }
}

impl ReadinessConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.max_attempts < MIN_MAX_ATTEMPTS || self.max_attempts > MAX_MAX_ATTEMPTS {
            return Err(ConfigError::readiness(format!(
                "readiness.max_attempts must be {}-{}, got {}",
                MIN_MAX_ATTEMPTS, MAX_MAX_ATTEMPTS, self.max_attempts
            )));
        }

        for (name, value) in [
            ("interval_ms", self.interval_ms),
            ("confirm_interval_ms", self.confirm_interval_ms),
        ] {
            if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&value) {
                return Err(ConfigError::readiness(format!(
                    "readiness.{} must be {}-{}, got {}",
                    name, MIN_INTERVAL_MS, MAX_INTERVAL_MS, value
                )));
            }
        }

        if self.status_refresh_every == 0 || self.status_refresh_every > self.max_attempts {
            return Err(ConfigError::readiness(format!(
                "readiness.status_refresh_every must be 1-{}, got {}",
                self.max_attempts, self.status_refresh_every
            )));
        }

        if self.confirm_attempts < MIN_CONFIRM_ATTEMPTS
            || self.confirm_attempts > MAX_CONFIRM_ATTEMPTS
        {
            return Err(ConfigError::readiness(format!(
                "readiness.confirm_attempts must be {}-{}, got {}",
                MIN_CONFIRM_ATTEMPTS, MAX_CONFIRM_ATTEMPTS, self.confirm_attempts
            )));
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn confirm_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_interval_ms)
    }
}
