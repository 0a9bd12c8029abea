mod api_config;
mod config;
mod deployment_config;
mod error;
mod events_config;
mod log_level;
mod logging_config;
mod push_config;
mod readiness_config;
mod retry_config;

#[cfg(test)]
mod tests;

pub use api_config::ApiConfig;
pub use config::Config;
pub use deployment_config::DeploymentConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use events_config::EventsConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use push_config::PushConfig;
pub use readiness_config::ReadinessConfig;
pub use retry_config::RetryConfig;

const CONFIG_DIR_ENV: &str = "STUDIO_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".studio";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_COLORED: bool = true;
