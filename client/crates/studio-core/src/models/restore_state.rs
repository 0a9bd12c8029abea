use serde::{Deserialize, Serialize};

/// Progress of a restore-to-snapshot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RestoreState {
    #[default]
    Idle,
    /// Snapshot is being materialized into the sandbox
    Loading,
    /// Snapshot is materialized, waiting for confirm or cancel
    Confirming,
}

impl RestoreState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Confirming => "confirming",
        }
    }
}

impl std::fmt::Display for RestoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
