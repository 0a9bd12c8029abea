use crate::{ConfigError, ConfigErrorResult, RetryConfig};

use serde::Deserialize;

pub const DEFAULT_PUSH_ENABLED: bool = true;

/// Push channel (WebSocket) settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub enabled: bool,
    /// Explicit WebSocket base URL; derived from `api.base_url` when unset
    pub url: Option<String>,
    /// Reconnect policy
    pub retry: RetryConfig,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_PUSH_ENABLED,
            url: None,
            retry: RetryConfig::default(),
        }
    }
}

impl PushConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if let Some(url) = &self.url
            && !(url.starts_with("ws://") || url.starts_with("wss://"))
        {
            return Err(ConfigError::push(format!(
                "push.url must start with ws:// or wss://, got '{url}'"
            )));
        }

        self.retry.validate()
    }

    /// WebSocket base URL: the explicit one, or `api_base_url` with the
    /// scheme swapped and `/ws` appended.
    pub fn resolve_url(&self, api_base_url: &str) -> String {
        if let Some(url) = &self.url {
            return url.trim_end_matches('/').to_string();
        }

        let base = api_base_url.trim_end_matches('/');
        let swapped = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };

        format!("{swapped}/ws")
    }
}
