use serde::{Deserialize, Serialize};

/// State of the published (public URL) copy of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    #[default]
    Idle,
    Deploying,
    Live,
    Error,
    Removing,
}

impl DeploymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Deploying => "deploying",
            Self::Live => "live",
            Self::Error => "error",
            Self::Removing => "removing",
        }
    }

    /// A publish or removal request is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Deploying | Self::Removing)
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
