use studio_client::ClientError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors surfaced by the orchestrator to its callers.
///
/// Loop-internal failures (a single failed poll, a dropped probe) never show
/// up here; only outcomes that end an operation do.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Network error: {message} {location}")]
    TransientNetwork {
        message: String,
        location: ErrorLocation,
    },

    #[error("Environment provisioning failed: {message} {location}")]
    ProvisioningFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("{operation} timed out after {attempts} attempts {location}")]
    Timeout {
        operation: &'static str,
        attempts: u32,
        location: ErrorLocation,
    },

    #[error("Subdomain {address} is already taken {location}")]
    NameConflict {
        address: String,
        location: ErrorLocation,
    },

    #[error("A restore is already in progress {location}")]
    RestoreInFlight { location: ErrorLocation },

    #[error("No restore is waiting for confirmation {location}")]
    NoPendingRestore { location: ErrorLocation },

    #[error("Restore failed: {message} {location}")]
    RestoreFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("A deployment is already in progress {location}")]
    DeploymentInFlight { location: ErrorLocation },

    #[error("Deployment failed: {message} {location}")]
    DeploymentFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Hosting integration not connected: {reason} {location}")]
    IntegrationNotConnected {
        reason: &'static str,
        location: ErrorLocation,
    },

    #[error("Invalid subdomain '{subdomain}': {reason} {location}")]
    InvalidSubdomain {
        subdomain: String,
        reason: &'static str,
        location: ErrorLocation,
    },

    #[error("Request rejected ({status}): {message} {location}")]
    Rejected {
        status: u16,
        message: String,
        location: ErrorLocation,
    },
}

impl OrchestratorError {
    #[track_caller]
    pub fn provisioning_failed(message: impl Into<String>) -> Self {
        Self::ProvisioningFailed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn timeout(operation: &'static str, attempts: u32) -> Self {
        Self::Timeout {
            operation,
            attempts,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn name_conflict(address: impl Into<String>) -> Self {
        Self::NameConflict {
            address: address.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn restore_in_flight() -> Self {
        Self::RestoreInFlight {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn no_pending_restore() -> Self {
        Self::NoPendingRestore {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn restore_failed(message: impl Into<String>) -> Self {
        Self::RestoreFailed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn deployment_in_flight() -> Self {
        Self::DeploymentInFlight {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn deployment_failed(message: impl Into<String>) -> Self {
        Self::DeploymentFailed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn integration_not_connected(reason: &'static str) -> Self {
        Self::IntegrationNotConnected {
            reason,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_subdomain(subdomain: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidSubdomain {
            subdomain: subdomain.into(),
            reason,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Translate a REST failure: transient ones stay retryable, the rest
    /// become a rejection carrying the backend's own message.
    #[track_caller]
    pub fn from_client(err: &ClientError) -> Self {
        let location = ErrorLocation::from(Location::caller());
        if err.is_transient() {
            return Self::TransientNetwork {
                message: err.user_message(),
                location,
            };
        }

        Self::Rejected {
            status: err.status().unwrap_or_default(),
            message: err.user_message(),
            location,
        }
    }

    /// Whether retrying the same operation later can succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork { .. } | Self::Timeout { .. })
    }

    /// Text for the user. Raw transport detail only goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::TransientNetwork { .. } => {
                String::from("Could not reach the server. Check your connection and try again.")
            }
            Self::ProvisioningFailed { .. } => String::from(
                "The development environment failed to start. Restart it to try again.",
            ),
            Self::Timeout { operation, .. } => {
                format!("{operation} is taking longer than expected. Try again in a moment.")
            }
            Self::NameConflict { address, .. } => {
                format!("{address} is already taken. Choose a different name.")
            }
            Self::RestoreInFlight { .. } => {
                String::from("A restore is already in progress. Wait for it to finish.")
            }
            Self::NoPendingRestore { .. } => {
                String::from("There is no restored version waiting for confirmation.")
            }
            Self::RestoreFailed { message, .. } => format!("Could not restore: {message}"),
            Self::DeploymentInFlight { .. } => {
                String::from("A deployment is already in progress. Wait for it to finish.")
            }
            Self::DeploymentFailed { message, .. } => format!("Deployment failed: {message}"),
            Self::IntegrationNotConnected { reason, .. } => {
                format!("Connect the hosting integration first: {reason}.")
            }
            Self::InvalidSubdomain { reason, .. } => format!("Invalid subdomain: {reason}."),
            Self::Rejected { message, .. } => message.clone(),
        }
    }
}

impl From<ClientError> for OrchestratorError {
    #[track_caller]
    fn from(err: ClientError) -> Self {
        log::debug!("Backend call failed: {err}");
        OrchestratorError::from_client(&err)
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
