use crate::{CoreError, CoreResult};

use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Health of the dev server inside the sandbox.
///
/// Independent of [`crate::ProjectStatus`]: a project can be `active` while its
/// dev server is still coming up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DevServerHealthState {
    /// Dev server answers and serves the preview
    Ready,
    /// Sandbox is not running, nothing to check
    #[default]
    Inactive,
    /// Backend had no information about the dev server yet
    Unavailable,
    /// Dev server answers with errors
    Unhealthy,
    /// The health check itself could not complete
    Unreachable,
}

impl DevServerHealthState {
    pub const ALL: [DevServerHealthState; 5] = [
        Self::Ready,
        Self::Inactive,
        Self::Unavailable,
        Self::Unhealthy,
        Self::Unreachable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Inactive => "inactive",
            Self::Unavailable => "unavailable",
            Self::Unhealthy => "unhealthy",
            Self::Unreachable => "unreachable",
        }
    }
}

impl FromStr for DevServerHealthState {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "ready" => Ok(Self::Ready),
            "inactive" => Ok(Self::Inactive),
            "unavailable" => Ok(Self::Unavailable),
            "unhealthy" => Ok(Self::Unhealthy),
            "unreachable" => Ok(Self::Unreachable),
            _ => Err(CoreError::InvalidHealthState {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl std::fmt::Display for DevServerHealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
