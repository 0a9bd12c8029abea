use studio_client::ClientError;
use studio_config::ConfigError;
use studio_orchestrator::OrchestratorError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {source} {location}")]
    Config {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },

    #[error("Client error: {source} {location}")]
    Client {
        #[source]
        source: ClientError,
        location: ErrorLocation,
    },

    #[error("{source}")]
    Orchestrator {
        #[source]
        source: OrchestratorError,
    },

    #[error("Logger error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },

    #[error("JSON error: {source} {location}")]
    Json {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("I/O error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl CliError {
    #[track_caller]
    pub fn logger(message: impl Into<String>) -> Self {
        CliError::Logger {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Text for the terminal; orchestrator failures have their own wording.
    pub fn user_message(&self) -> String {
        match self {
            CliError::Orchestrator { source } => source.user_message(),
            CliError::Client { source, .. } => source.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<ConfigError> for CliError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        CliError::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ClientError> for CliError {
    #[track_caller]
    fn from(source: ClientError) -> Self {
        CliError::Client {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<OrchestratorError> for CliError {
    fn from(source: OrchestratorError) -> Self {
        CliError::Orchestrator { source }
    }
}

impl From<serde_json::Error> for CliError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        CliError::Json {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for CliError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CliError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
