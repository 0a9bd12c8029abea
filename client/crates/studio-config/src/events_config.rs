use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const MIN_CHANNEL_CAPACITY: usize = 16;
pub const MAX_CHANNEL_CAPACITY: usize = 65_536;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Buffered events per subscriber before slow subscribers start lagging
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl EventsConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.channel_capacity < MIN_CHANNEL_CAPACITY
            || self.channel_capacity > MAX_CHANNEL_CAPACITY
        {
            return Err(ConfigError::config(format!(
                "events.channel_capacity must be {}-{}, got {}",
                MIN_CHANNEL_CAPACITY, MAX_CHANNEL_CAPACITY, self.channel_capacity
            )));
        }

        Ok(())
    }
}
