use crate::{CoreError, CoreResult};

use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a project's sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Sandbox is being provisioned for the first time
    Creating,
    /// Sandbox exists and is booting
    Starting,
    /// Sandbox is running
    Active,
    /// Sandbox is paused; the last preview frame may still be shown
    Stopped,
    /// Sandbox has been archived and must be resumed explicitly
    Archived,
    /// Provisioning failed; sticky until an explicit restart
    Failed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 6] = [
        Self::Creating,
        Self::Starting,
        Self::Active,
        Self::Stopped,
        Self::Archived,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Stopped => "stopped",
            Self::Archived => "archived",
            Self::Failed => "failed",
        }
    }

    /// Paused states keep the cached preview frame behind an overlay.
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Stopped | Self::Archived)
    }

    /// States in which the sandbox is still on its way to `Active`.
    pub fn is_provisioning(&self) -> bool {
        matches!(self, Self::Creating | Self::Starting)
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "creating" => Ok(Self::Creating),
            "starting" => Ok(Self::Starting),
            "active" => Ok(Self::Active),
            "stopped" => Ok(Self::Stopped),
            "archived" => Ok(Self::Archived),
            "failed" => Ok(Self::Failed),
            _ => Err(CoreError::InvalidProjectStatus {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
