use crate::{
    ApiConfig, CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult,
    DEFAULT_CONFIG_DIR, DeploymentConfig, EventsConfig, LoggingConfig, PushConfig,
    ReadinessConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub push: PushConfig,
    pub readiness: ReadinessConfig,
    pub deployment: DeploymentConfig,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for STUDIO_CONFIG_DIR env var, else use ./.studio/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply STUDIO_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from_dir(&config_dir)
    }

    /// Same as [`Config::load`] but rooted at an explicit directory.
    pub fn load_from_dir(config_dir: &Path) -> ConfigErrorResult<Self> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.to_path_buf(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &PathBuf) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: STUDIO_CONFIG_DIR env var > ./.studio/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.api.validate()?;
        self.push.validate()?;
        self.readiness.validate()?;
        self.deployment.validate()?;
        self.events.validate()?;

        Ok(())
    }

    /// Effective WebSocket base URL for the push channel.
    pub fn push_url(&self) -> String {
        self.push.resolve_url(&self.api.base_url)
    }

    /// Log configuration summary (never logs the user id).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  api: {} (timeout {}s, health {}ms, user: {})",
            self.api.base_url,
            self.api.request_timeout_secs,
            self.api.health_timeout_ms,
            if self.api.user_id.is_some() {
                "set"
            } else {
                "none"
            }
        );

        info!(
            "  push: {} ({})",
            if self.push.enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.push_url()
        );

        info!(
            "  push.retry: attempts={}, initial={}ms, max={}s, backoff={}x",
            self.push.retry.max_attempts,
            self.push.retry.initial_delay_ms,
            self.push.retry.max_delay_secs,
            self.push.retry.backoff_multiplier
        );

        info!(
            "  readiness: attempts={}, interval={}ms, refresh every {}, confirm={}x{}ms",
            self.readiness.max_attempts,
            self.readiness.interval_ms,
            self.readiness.status_refresh_every,
            self.readiness.confirm_attempts,
            self.readiness.confirm_interval_ms
        );

        info!(
            "  deployment: poll={}s x{}, suffix={}, external poll={}s x{}",
            self.deployment.poll_interval_secs,
            self.deployment.max_poll_attempts,
            self.deployment.subdomain_suffix,
            self.deployment.external_poll_interval_secs,
            self.deployment.external_max_poll_attempts
        );

        info!("  events: capacity={}", self.events.channel_capacity);

        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );
    }

    fn apply_env_overrides(&mut self) {
        // Api
        Self::apply_env_string("STUDIO_API_BASE_URL", &mut self.api.base_url);
        Self::apply_env_option_string("STUDIO_API_USER_ID", &mut self.api.user_id);
        Self::apply_env_parse(
            "STUDIO_API_REQUEST_TIMEOUT_SECS",
            &mut self.api.request_timeout_secs,
        );
        Self::apply_env_parse(
            "STUDIO_API_HEALTH_TIMEOUT_MS",
            &mut self.api.health_timeout_ms,
        );

        // Push
        Self::apply_env_bool("STUDIO_PUSH_ENABLED", &mut self.push.enabled);
        Self::apply_env_option_string("STUDIO_PUSH_URL", &mut self.push.url);
        Self::apply_env_parse(
            "STUDIO_PUSH_RETRY_MAX_ATTEMPTS",
            &mut self.push.retry.max_attempts,
        );
        Self::apply_env_parse(
            "STUDIO_PUSH_RETRY_INITIAL_DELAY_MS",
            &mut self.push.retry.initial_delay_ms,
        );
        Self::apply_env_parse(
            "STUDIO_PUSH_RETRY_MAX_DELAY_SECS",
            &mut self.push.retry.max_delay_secs,
        );
        Self::apply_env_parse(
            "STUDIO_PUSH_RETRY_BACKOFF_MULTIPLIER",
            &mut self.push.retry.backoff_multiplier,
        );
        Self::apply_env_bool("STUDIO_PUSH_RETRY_JITTER", &mut self.push.retry.jitter);

        // Readiness
        Self::apply_env_parse(
            "STUDIO_READINESS_MAX_ATTEMPTS",
            &mut self.readiness.max_attempts,
        );
        Self::apply_env_parse(
            "STUDIO_READINESS_INTERVAL_MS",
            &mut self.readiness.interval_ms,
        );
        Self::apply_env_parse(
            "STUDIO_READINESS_STATUS_REFRESH_EVERY",
            &mut self.readiness.status_refresh_every,
        );
        Self::apply_env_parse(
            "STUDIO_READINESS_CONFIRM_ATTEMPTS",
            &mut self.readiness.confirm_attempts,
        );
        Self::apply_env_parse(
            "STUDIO_READINESS_CONFIRM_INTERVAL_MS",
            &mut self.readiness.confirm_interval_ms,
        );

        // Deployment
        Self::apply_env_parse(
            "STUDIO_DEPLOYMENT_POLL_INTERVAL_SECS",
            &mut self.deployment.poll_interval_secs,
        );
        Self::apply_env_parse(
            "STUDIO_DEPLOYMENT_MAX_POLL_ATTEMPTS",
            &mut self.deployment.max_poll_attempts,
        );
        Self::apply_env_string(
            "STUDIO_DEPLOYMENT_SUBDOMAIN_SUFFIX",
            &mut self.deployment.subdomain_suffix,
        );
        Self::apply_env_parse(
            "STUDIO_DEPLOYMENT_EXTERNAL_POLL_INTERVAL_SECS",
            &mut self.deployment.external_poll_interval_secs,
        );
        Self::apply_env_parse(
            "STUDIO_DEPLOYMENT_EXTERNAL_MAX_POLL_ATTEMPTS",
            &mut self.deployment.external_max_poll_attempts,
        );

        // Events
        Self::apply_env_parse(
            "STUDIO_EVENTS_CHANNEL_CAPACITY",
            &mut self.events.channel_capacity,
        );

        // Logging
        Self::apply_env_parse("STUDIO_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("STUDIO_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("STUDIO_LOG_FILE", &mut self.logging.file);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
